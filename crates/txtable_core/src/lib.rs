//! # TxTable Core
//!
//! Snapshot transactions over a non-transactional versioned store.
//!
//! [`TransactionAwareTable`] wraps any [`CellStore`](txtable_store::CellStore)
//! and makes it a participant in transactions issued by an external
//! coordinator:
//! - reads are limited to the transaction's snapshot
//! - writes are stamped with the write pointer and held in a local log
//! - commit replays the log against the store
//! - rollback applies compensating writes built from pre-images
//!
//! The coordinator itself (id allocation, conflict detection) lives
//! elsewhere and talks to tables through [`TransactionAware`].
//!
//! ## Example
//!
//! ```rust
//! use txtable_codec::Transaction;
//! use txtable_core::{TableState, TransactionAwareTable};
//! use txtable_store::{Delete, Get, InMemoryStore, Put, Version};
//!
//! let store = InMemoryStore::new();
//! let mut seed = Put::with_timestamp("row", Version::new(1));
//! seed.add("f", "c", "v0");
//! txtable_store::CellStore::put(&store, &seed).unwrap();
//!
//! let mut table = TransactionAwareTable::new(store);
//! table.bind(Transaction::new(Version::new(1), Version::new(2), [])).unwrap();
//! table.delete(&Delete::new("row")).unwrap();
//! assert_eq!(table.state(), TableState::BoundDirty);
//! table.rollback_tx().unwrap();
//!
//! table.bind(Transaction::new(Version::new(2), Version::new(3), [])).unwrap();
//! let row = table.get(&Get::new("row")).unwrap();
//! assert_eq!(row.value(b"f", b"c"), Some(&b"v0"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod aware;
mod config;
mod error;
mod log;
mod resolver;
mod table;

pub use aware::TransactionAware;
pub use config::TableConfig;
pub use error::{CoreError, CoreResult, ResolverError, ResolverResult};
pub use log::{PendingLog, PendingMutation};
pub use resolver::{
    ArtifactId, ArtifactResolver, ArtifactSelector, ArtifactVersion, PluginDescriptor,
    ResolvedPlugin, StaticArtifactResolver,
};
pub use table::{TableState, TransactionAwareTable};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # TxTable Testkit
//!
//! Test utilities for TxTable.
//!
//! This crate provides:
//! - Fixtures for seeded stores and transactions
//! - A store wrapper that records calls and injects failures
//! - A minimal in-process transaction coordinator
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use txtable_testkit::prelude::*;
//! use txtable_core::TransactionAwareTable;
//!
//! let store = seeded_store(&[("row", 1, "v0")]);
//! let mut table = TransactionAwareTable::new(store);
//! table.bind(tx(1, 2, &[])).unwrap();
//! assert_eq!(read_value(&mut table, "row"), Some(b"v0".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod fault;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coordinator::*;
    pub use crate::fault::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use coordinator::*;
pub use fault::*;
pub use fixtures::*;
pub use generators::*;

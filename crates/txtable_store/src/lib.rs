//! # TxTable Store
//!
//! The versioned cell store contract that TxTable runs on top of, plus an
//! in-memory reference implementation.
//!
//! A store is a sorted map of rows. Each row holds columns addressed by
//! `family:qualifier`, and each column holds timestamped versions. The store
//! itself has no notion of transactions: every operation is applied per cell,
//! immediately or through a client-side write buffer that [`CellStore::flush`]
//! drains.
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing, demos and embedding
//!
//! ## Example
//!
//! ```rust
//! use txtable_store::{CellStore, Get, InMemoryStore, Put, Version};
//!
//! let store = InMemoryStore::new();
//! let mut put = Put::with_timestamp("row-1", Version::new(7));
//! put.add("f", "c", "hello");
//! store.put(&put).unwrap();
//!
//! let result = store.get(&Get::new("row-1")).unwrap();
//! assert_eq!(result.value(b"f", b"c"), Some(&b"hello"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod memory;
mod ops;
mod types;

pub use backend::CellStore;
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use ops::{
    Append, Attributes, CellFilter, ColumnSelector, Delete, DeleteScope, Durability, Get,
    Increment, Mutation, OperationWithAttributes, Put, RowMutations, Scan,
};
pub use types::{decode_counter, encode_counter, Cell, RowResult, Version};

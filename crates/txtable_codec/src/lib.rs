//! # TxTable Codec
//!
//! The [`Transaction`] descriptor and its wire encoding.
//!
//! Transactions are issued by an external coordinator and travel with every
//! request a transactional table sends to its store. The encoding is
//! canonical CBOR, so the same transaction always produces the same bytes.
//!
//! ## Usage
//!
//! ```
//! use txtable_codec::{Transaction, TransactionCodec, TX_OPERATION_ATTRIBUTE_KEY};
//! use txtable_store::{OperationWithAttributes, Put, Version};
//!
//! let tx = Transaction::new(Version::new(4), Version::new(5), []);
//!
//! let mut put = Put::new("row");
//! TransactionCodec::add_to_operation(&mut put, &tx).unwrap();
//! assert!(put.attribute(TX_OPERATION_ATTRIBUTE_KEY).is_some());
//!
//! let attached = TransactionCodec::from_operation(&put).unwrap();
//! assert_eq!(attached, Some(tx));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod transaction;

pub use codec::{TransactionCodec, FORMAT_VERSION, TX_OPERATION_ATTRIBUTE_KEY};
pub use error::{CodecError, CodecResult};
pub use transaction::Transaction;

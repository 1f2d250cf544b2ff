//! Canonical CBOR encoding of transactions.
//!
//! A descriptor is a CBOR map with text keys in canonical order:
//!
//! | Key  | Value |
//! |------|-------|
//! | `v`  | format version, currently `1` |
//! | `ex` | excluded versions, ascending |
//! | `rp` | read pointer |
//! | `wp` | write pointer |
//!
//! Integers use the shortest CBOR form, so equal transactions always encode
//! to identical bytes.

use crate::error::{CodecError, CodecResult};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use txtable_store::{OperationWithAttributes, Version};

/// Attribute key under which an encoded transaction rides on an operation.
pub const TX_OPERATION_ATTRIBUTE_KEY: &str = "txtable.tx";

/// Current descriptor format version.
pub const FORMAT_VERSION: u64 = 1;

// Field order is the canonical key order (shorter keys first, then bytewise)
#[derive(Debug, Serialize, Deserialize)]
struct WireTransaction {
    v: u64,
    ex: Vec<u64>,
    rp: u64,
    wp: u64,
}

impl From<&Transaction> for WireTransaction {
    fn from(tx: &Transaction) -> Self {
        Self {
            v: FORMAT_VERSION,
            ex: tx.excluded().iter().map(|v| v.as_u64()).collect(),
            rp: tx.read_pointer().as_u64(),
            wp: tx.write_pointer().as_u64(),
        }
    }
}

/// Encodes and decodes [`Transaction`] descriptors.
///
/// # Example
///
/// ```rust
/// use txtable_codec::{Transaction, TransactionCodec};
/// use txtable_store::Version;
///
/// let tx = Transaction::new(Version::new(9), Version::new(10), [Version::new(8)]);
/// let bytes = TransactionCodec::encode(&tx).unwrap();
/// assert_eq!(TransactionCodec::decode(&bytes).unwrap(), tx);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionCodec;

impl TransactionCodec {
    /// Encodes a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidTransaction`] if
    /// [`Transaction::validate`] fails, or [`CodecError::EncodingFailed`]
    /// if serialization fails.
    pub fn encode(tx: &Transaction) -> CodecResult<Vec<u8>> {
        tx.validate()?;
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&WireTransaction::from(tx), &mut bytes)
            .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
        Ok(bytes)
    }

    /// Decodes a transaction.
    ///
    /// # Errors
    ///
    /// - [`CodecError::DecodingFailed`] for malformed bytes or trailing data
    /// - [`CodecError::UnsupportedVersion`] for an unknown format version
    /// - [`CodecError::InvalidTransaction`] if an excluded version is above
    ///   the write pointer, or the write pointer is [`Version::LATEST`]
    pub fn decode(bytes: &[u8]) -> CodecResult<Transaction> {
        let mut reader = bytes;
        let wire: WireTransaction = ciborium::de::from_reader(&mut reader)
            .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
        if !reader.is_empty() {
            return Err(CodecError::decoding_failed(format!(
                "{} trailing bytes after descriptor",
                reader.len()
            )));
        }
        if wire.v != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion { version: wire.v });
        }

        let tx = Transaction::new(
            Version::new(wire.rp),
            Version::new(wire.wp),
            wire.ex.into_iter().map(Version::new),
        );
        tx.validate()?;
        Ok(tx)
    }

    /// Attaches the encoded transaction to an operation.
    ///
    /// # Errors
    ///
    /// Returns the [`TransactionCodec::encode`] error.
    pub fn add_to_operation<O>(op: &mut O, tx: &Transaction) -> CodecResult<()>
    where
        O: OperationWithAttributes + ?Sized,
    {
        op.set_attribute(TX_OPERATION_ATTRIBUTE_KEY, Self::encode(tx)?);
        Ok(())
    }

    /// Reads the transaction attached to an operation, if any.
    ///
    /// # Errors
    ///
    /// Returns a decoding error if the attribute is present but malformed.
    pub fn from_operation<O>(op: &O) -> CodecResult<Option<Transaction>>
    where
        O: OperationWithAttributes + ?Sized,
    {
        op.attribute(TX_OPERATION_ATTRIBUTE_KEY)
            .map(Self::decode)
            .transpose()
    }
}

//! Encode command implementation.

use crate::hex;
use crate::Format;
use serde::Serialize;
use txtable_codec::{Transaction, TransactionCodec};
use txtable_store::Version;

/// Encoding result for output.
#[derive(Debug, Serialize)]
pub struct EncodeResult {
    /// Read pointer.
    pub read_pointer: u64,
    /// Write pointer.
    pub write_pointer: u64,
    /// Excluded versions, ascending.
    pub excluded: Vec<u64>,
    /// Encoded descriptor as hex.
    pub descriptor: String,
    /// Descriptor length in bytes.
    pub length: usize,
}

/// Runs the encode command.
pub fn run(
    read_pointer: u64,
    write_pointer: u64,
    exclude: &[u64],
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let tx = Transaction::new(
        Version::new(read_pointer),
        Version::new(write_pointer),
        exclude.iter().copied().map(Version::new),
    );
    let bytes = TransactionCodec::encode(&tx)?;
    tracing::debug!(%tx, length = bytes.len(), "encoded transaction");

    let result = EncodeResult {
        read_pointer,
        write_pointer,
        excluded: tx.excluded().iter().map(|v| v.as_u64()).collect(),
        descriptor: hex::encode(&bytes),
        length: bytes.len(),
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => println!("{}", result.descriptor),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_exclusion_above_write_pointer() {
        assert!(run(3, 4, &[9], Format::Text).is_err());
    }
}

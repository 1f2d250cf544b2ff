//! Decode command implementation.

use crate::hex;
use crate::Format;
use serde::Serialize;
use txtable_codec::{Transaction, TransactionCodec};

/// Decoded descriptor for output.
#[derive(Debug, Serialize)]
pub struct DecodeResult {
    /// Transaction id (the write pointer).
    pub id: u64,
    /// Read pointer.
    pub read_pointer: u64,
    /// Write pointer.
    pub write_pointer: u64,
    /// Excluded versions, ascending.
    pub excluded: Vec<u64>,
}

impl From<&Transaction> for DecodeResult {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id().as_u64(),
            read_pointer: tx.read_pointer().as_u64(),
            write_pointer: tx.write_pointer().as_u64(),
            excluded: tx.excluded().iter().map(|v| v.as_u64()).collect(),
        }
    }
}

/// Runs the decode command.
pub fn run(descriptor: &str, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = hex::decode(descriptor)?;
    let tx = TransactionCodec::decode(&bytes)?;
    let result = DecodeResult::from(&tx);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => {
            println!("Transaction:");
            println!("  Id: {}", result.id);
            println!("  Read pointer: {}", result.read_pointer);
            println!("  Write pointer: {}", result.write_pointer);
            if result.excluded.is_empty() {
                println!("  Excluded: none");
            } else {
                let excluded: Vec<String> =
                    result.excluded.iter().map(ToString::to_string).collect();
                println!("  Excluded: {}", excluded.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txtable_store::Version;

    #[test]
    fn decode_result_from_transaction() {
        let tx = Transaction::new(Version::new(9), Version::new(10), [Version::new(3)]);
        let bytes = TransactionCodec::encode(&tx).unwrap();
        let parsed = hex::decode(&hex::encode(&bytes)).unwrap();
        let decoded = TransactionCodec::decode(&parsed).unwrap();

        let result = DecodeResult::from(&decoded);
        assert_eq!(result.id, 10);
        assert_eq!(result.read_pointer, 9);
        assert_eq!(result.write_pointer, 10);
        assert_eq!(result.excluded, vec![3]);
    }
}

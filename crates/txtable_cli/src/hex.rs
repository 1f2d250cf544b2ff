//! Lowercase hex formatting for descriptors.

use thiserror::Error;

/// Errors parsing hex input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HexError {
    /// Input has an odd number of digits.
    #[error("hex input has odd length {0}")]
    OddLength(usize),

    /// Input contains a non-hex character.
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidDigit {
        /// The offending character.
        digit: char,
        /// Its position in the input.
        position: usize,
    },
}

/// Formats bytes as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parses hex, ignoring surrounding whitespace and an optional `0x` prefix.
pub fn decode(input: &str) -> Result<Vec<u8>, HexError> {
    let input = input.trim();
    let input = input.strip_prefix("0x").unwrap_or(input);
    if input.len() % 2 != 0 {
        return Err(HexError::OddLength(input.len()));
    }

    let digit = |position: usize, c: char| {
        c.to_digit(16)
            .map(|d| d as u8)
            .ok_or(HexError::InvalidDigit { digit: c, position })
    };
    let chars: Vec<char> = input.chars().collect();
    chars
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| Ok((digit(2 * i, pair[0])? << 4) | digit(2 * i + 1, pair[1])?))
        .collect()
}

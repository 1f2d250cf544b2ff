//! Core value types: versions, cells and row results.

use crate::error::{StoreError, StoreResult};
use std::cmp::Reverse;
use std::fmt;

/// A cell timestamp.
///
/// Versions double as transaction pointers: a transaction's writes are all
/// stamped with its write pointer, and its reads see versions up to its
/// read pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64);

impl Version {
    /// The oldest possible version.
    pub const MIN: Version = Version(0);

    /// Sentinel asking the store to assign a timestamp when the write is applied.
    pub const LATEST: Version = Version(u64::MAX);

    /// Creates a new version.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true if this is the [`Version::LATEST`] sentinel.
    #[must_use]
    pub const fn is_latest(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns the next version, saturating at [`Version::LATEST`].
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_latest() {
            write!(f, "v:latest")
        } else {
            write!(f, "v:{}", self.0)
        }
    }
}

impl From<u64> for Version {
    fn from(version: u64) -> Self {
        Self(version)
    }
}

/// A single versioned cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Column family.
    pub family: Vec<u8>,
    /// Column qualifier.
    pub qualifier: Vec<u8>,
    /// Version of this cell.
    pub timestamp: Version,
    /// Cell value.
    pub value: Vec<u8>,
}

impl Cell {
    /// Creates a new cell.
    pub fn new(
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: Version,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            timestamp,
            value: value.into(),
        }
    }

    /// Returns true if this cell belongs to `family:qualifier`.
    #[must_use]
    pub fn is_column(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.family == family && self.qualifier == qualifier
    }
}

/// The cells returned for one row by a get or scan.
///
/// Cells are ordered by family, then qualifier, then newest version first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowResult {
    row: Vec<u8>,
    cells: Vec<Cell>,
}

impl RowResult {
    /// Creates a row result, sorting the cells into result order.
    pub fn new(row: impl Into<Vec<u8>>, mut cells: Vec<Cell>) -> Self {
        cells.sort_by(|a, b| {
            (&a.family, &a.qualifier, Reverse(a.timestamp)).cmp(&(
                &b.family,
                &b.qualifier,
                Reverse(b.timestamp),
            ))
        });
        Self {
            row: row.into(),
            cells,
        }
    }

    /// Creates a result with no cells.
    pub fn empty(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            cells: Vec::new(),
        }
    }

    /// Returns the row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns all cells.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Consumes the result and returns its cells.
    #[must_use]
    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }

    /// Returns true if no cell was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns the newest cell of `family:qualifier`.
    #[must_use]
    pub fn latest(&self, family: &[u8], qualifier: &[u8]) -> Option<&Cell> {
        self.cells.iter().find(|c| c.is_column(family, qualifier))
    }

    /// Returns the newest value of `family:qualifier`.
    #[must_use]
    pub fn value(&self, family: &[u8], qualifier: &[u8]) -> Option<&[u8]> {
        self.latest(family, qualifier).map(|c| c.value.as_slice())
    }

    /// Returns every returned version of `family:qualifier`, newest first.
    pub fn column_versions<'a>(
        &'a self,
        family: &'a [u8],
        qualifier: &'a [u8],
    ) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .iter()
            .filter(move |c| c.is_column(family, qualifier))
    }
}

/// Encodes a counter value the way increments store it (8 bytes, big-endian).
#[must_use]
pub fn encode_counter(value: i64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decodes a counter value written by an increment.
///
/// # Errors
///
/// Returns [`StoreError::InvalidValue`] if `bytes` is not exactly 8 bytes long.
pub fn decode_counter(bytes: &[u8]) -> StoreResult<i64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        StoreError::invalid_value(format!(
            "counter must be 8 bytes, found {} bytes",
            bytes.len()
        ))
    })?;
    Ok(i64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering_and_next() {
        let v1 = Version::new(1);
        assert!(v1 < v1.next());
        assert_eq!(Version::LATEST.next(), Version::LATEST);
        assert!(Version::LATEST.is_latest());
    }

    #[test]
    fn version_display() {
        assert_eq!(format!("{}", Version::new(42)), "v:42");
        assert_eq!(format!("{}", Version::LATEST), "v:latest");
    }

    #[test]
    fn row_result_orders_newest_first() {
        let result = RowResult::new(
            "r",
            vec![
                Cell::new("f", "b", Version::new(1), "b1"),
                Cell::new("f", "a", Version::new(1), "a1"),
                Cell::new("f", "a", Version::new(3), "a3"),
            ],
        );

        let order: Vec<_> = result
            .cells()
            .iter()
            .map(|c| (c.qualifier.clone(), c.timestamp.as_u64()))
            .collect();
        assert_eq!(
            order,
            vec![(b"a".to_vec(), 3), (b"a".to_vec(), 1), (b"b".to_vec(), 1)]
        );
        assert_eq!(result.value(b"f", b"a"), Some(&b"a3"[..]));
        assert_eq!(result.column_versions(b"f", b"a").count(), 2);
    }

    #[test]
    fn empty_result() {
        let result = RowResult::empty("r");
        assert!(result.is_empty());
        assert_eq!(result.row(), b"r");
        assert!(result.value(b"f", b"c").is_none());
    }

    #[test]
    fn counter_roundtrip_and_bad_length() {
        assert_eq!(decode_counter(&encode_counter(-5)).unwrap(), -5);
        assert!(matches!(
            decode_counter(b"abc"),
            Err(StoreError::InvalidValue { .. })
        ));
    }
}

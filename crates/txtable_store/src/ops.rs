//! Operation types sent to a [`CellStore`](crate::CellStore).
//!
//! Every operation carries an attribute map. Stores pass attributes through
//! untouched; layers above use them to attach request metadata such as an
//! encoded transaction.

use crate::error::{StoreError, StoreResult};
use crate::types::{Cell, Version};
use std::collections::{BTreeMap, BTreeSet};

/// Request metadata attached to an operation.
pub type Attributes = BTreeMap<String, Vec<u8>>;

/// Operations that carry an attribute map.
pub trait OperationWithAttributes {
    /// Returns all attributes.
    fn attributes(&self) -> &Attributes;

    /// Returns the attribute map for modification.
    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Returns a single attribute.
    fn attribute(&self, key: &str) -> Option<&[u8]> {
        self.attributes().get(key).map(Vec::as_slice)
    }

    /// Sets a single attribute, replacing any previous value.
    fn set_attribute(&mut self, key: &str, value: Vec<u8>) {
        self.attributes_mut().insert(key.to_string(), value);
    }
}

macro_rules! impl_attributes {
    ($($ty:ty),* $(,)?) => {
        $(
            impl OperationWithAttributes for $ty {
                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }

                fn attributes_mut(&mut self) -> &mut Attributes {
                    &mut self.attributes
                }
            }
        )*
    };
}

impl_attributes!(Get, Scan, Put, Delete, Append, Increment);

/// How durably the store should persist a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Durability {
    /// Use the table's default.
    #[default]
    UseDefault,
    /// Skip the write-ahead log.
    SkipWal,
    /// Write the log asynchronously.
    AsyncWal,
    /// Write the log synchronously.
    SyncWal,
    /// Write and fsync the log.
    FsyncWal,
}

/// Selects the columns a read returns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnSelector {
    /// Every qualifier of a family.
    Family(Vec<u8>),
    /// A single `family:qualifier` column.
    Column(Vec<u8>, Vec<u8>),
}

impl ColumnSelector {
    /// Returns true if this selector covers `family:qualifier`.
    #[must_use]
    pub fn matches(&self, family: &[u8], qualifier: &[u8]) -> bool {
        match self {
            Self::Family(f) => f == family,
            Self::Column(f, q) => f == family && q == qualifier,
        }
    }
}

/// Column and version selection shared by gets and scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFilter {
    /// Columns to return. Empty means every column.
    pub columns: Vec<ColumnSelector>,
    /// Highest version returned (inclusive). `None` means no ceiling.
    pub max_version: Option<Version>,
    /// Versions that must never be returned.
    pub excluded: BTreeSet<Version>,
    /// Maximum number of versions returned per column.
    pub max_versions: u32,
}

impl Default for CellFilter {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            max_version: None,
            excluded: BTreeSet::new(),
            max_versions: 1,
        }
    }
}

impl CellFilter {
    /// Returns true if `family:qualifier` is selected.
    #[must_use]
    pub fn admits_column(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.columns.is_empty() || self.columns.iter().any(|c| c.matches(family, qualifier))
    }

    /// Returns true if a cell at `version` may be returned.
    #[must_use]
    pub fn admits_version(&self, version: Version) -> bool {
        self.max_version.map_or(true, |ceiling| version <= ceiling)
            && !self.excluded.contains(&version)
    }
}

/// A single-row read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    /// Row key.
    pub row: Vec<u8>,
    /// Column and version selection.
    pub filter: CellFilter,
    /// Request metadata.
    pub attributes: Attributes,
}

impl Get {
    /// Creates a get returning the newest version of every column in `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            filter: CellFilter::default(),
            attributes: Attributes::new(),
        }
    }

    /// Restricts the get to a family.
    #[must_use]
    pub fn add_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.filter.columns.push(ColumnSelector::Family(family.into()));
        self
    }

    /// Restricts the get to a column.
    #[must_use]
    pub fn add_column(mut self, family: impl Into<Vec<u8>>, qualifier: impl Into<Vec<u8>>) -> Self {
        self.filter
            .columns
            .push(ColumnSelector::Column(family.into(), qualifier.into()));
        self
    }

    /// Sets the highest version returned.
    #[must_use]
    pub fn with_max_version(mut self, version: Version) -> Self {
        self.filter.max_version = Some(version);
        self
    }

    /// Sets how many versions per column are returned.
    #[must_use]
    pub fn with_max_versions(mut self, versions: u32) -> Self {
        self.filter.max_versions = versions;
        self
    }

    /// Hides the given versions from the result.
    #[must_use]
    pub fn with_excluded(mut self, versions: impl IntoIterator<Item = Version>) -> Self {
        self.filter.excluded.extend(versions);
        self
    }
}

/// A range read over rows `[start_row, stop_row)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scan {
    /// First row returned (inclusive).
    pub start_row: Vec<u8>,
    /// Row at which the scan stops (exclusive). `None` scans to the end.
    pub stop_row: Option<Vec<u8>>,
    /// Column and version selection.
    pub filter: CellFilter,
    /// Request metadata.
    pub attributes: Attributes,
}

impl Scan {
    /// Creates a scan over the whole table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scan over `[start_row, stop_row)`.
    pub fn range(start_row: impl Into<Vec<u8>>, stop_row: impl Into<Vec<u8>>) -> Self {
        Self {
            start_row: start_row.into(),
            stop_row: Some(stop_row.into()),
            ..Self::default()
        }
    }

    /// Restricts the scan to a family.
    #[must_use]
    pub fn add_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.filter.columns.push(ColumnSelector::Family(family.into()));
        self
    }

    /// Restricts the scan to a column.
    #[must_use]
    pub fn add_column(mut self, family: impl Into<Vec<u8>>, qualifier: impl Into<Vec<u8>>) -> Self {
        self.filter
            .columns
            .push(ColumnSelector::Column(family.into(), qualifier.into()));
        self
    }

    /// Sets how many versions per column are returned.
    #[must_use]
    pub fn with_max_versions(mut self, versions: u32) -> Self {
        self.filter.max_versions = versions;
        self
    }

    /// Returns true if `row` falls inside the scan range.
    #[must_use]
    pub fn contains_row(&self, row: &[u8]) -> bool {
        row >= self.start_row.as_slice()
            && self.stop_row.as_deref().map_or(true, |stop| row < stop)
    }
}

/// A single-row write of one or more cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Put {
    /// Row key.
    pub row: Vec<u8>,
    /// Timestamp given to cells added with [`Put::add`].
    pub timestamp: Version,
    /// Cells to write.
    pub cells: Vec<Cell>,
    /// Request metadata.
    pub attributes: Attributes,
    /// Durability preference.
    pub durability: Durability,
}

impl Put {
    /// Creates a put whose cells get a store-assigned timestamp.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self::with_timestamp(row, Version::LATEST)
    }

    /// Creates a put whose cells default to `timestamp`.
    pub fn with_timestamp(row: impl Into<Vec<u8>>, timestamp: Version) -> Self {
        Self {
            row: row.into(),
            timestamp,
            cells: Vec::new(),
            attributes: Attributes::new(),
            durability: Durability::UseDefault,
        }
    }

    /// Adds a cell at the put's timestamp.
    pub fn add(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        let timestamp = self.timestamp;
        self.add_at(family, qualifier, timestamp, value)
    }

    /// Adds a cell at an explicit timestamp.
    pub fn add_at(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        timestamp: Version,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.cells.push(Cell::new(family, qualifier, timestamp, value));
        self
    }

    /// Sets the durability preference.
    pub fn set_durability(&mut self, durability: Durability) -> &mut Self {
        self.durability = durability;
        self
    }

    /// Returns true if the put has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Which cells of a row a [`Delete`] removes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeleteScope {
    /// Every column of a family, versions at or below the delete timestamp.
    Family(Vec<u8>),
    /// One column, versions at or below the delete timestamp.
    Column(Vec<u8>, Vec<u8>),
    /// Exactly one version of one column.
    Version(Vec<u8>, Vec<u8>, Version),
}

/// A single-row delete.
///
/// With no scopes the whole row is deleted up to the delete timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    /// Row key.
    pub row: Vec<u8>,
    /// Highest version removed by row, family and column scopes.
    pub timestamp: Version,
    /// What to delete. Empty means the whole row.
    pub scopes: Vec<DeleteScope>,
    /// Request metadata.
    pub attributes: Attributes,
    /// Durability preference.
    pub durability: Durability,
}

impl Delete {
    /// Creates a delete of every version of the row.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self::with_timestamp(row, Version::LATEST)
    }

    /// Creates a delete of the row's versions at or below `timestamp`.
    pub fn with_timestamp(row: impl Into<Vec<u8>>, timestamp: Version) -> Self {
        Self {
            row: row.into(),
            timestamp,
            scopes: Vec::new(),
            attributes: Attributes::new(),
            durability: Durability::UseDefault,
        }
    }

    /// Narrows the delete to a family.
    pub fn delete_family(&mut self, family: impl Into<Vec<u8>>) -> &mut Self {
        self.scopes.push(DeleteScope::Family(family.into()));
        self
    }

    /// Narrows the delete to a column.
    pub fn delete_column(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.scopes
            .push(DeleteScope::Column(family.into(), qualifier.into()));
        self
    }

    /// Narrows the delete to one exact version of a column.
    pub fn delete_version(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        version: Version,
    ) -> &mut Self {
        self.scopes.push(DeleteScope::Version(
            family.into(),
            qualifier.into(),
            version,
        ));
        self
    }

    /// Sets the durability preference.
    pub fn set_durability(&mut self, durability: Durability) -> &mut Self {
        self.durability = durability;
        self
    }

    /// Returns true if this delete removes the given cell version.
    #[must_use]
    pub fn covers(&self, family: &[u8], qualifier: &[u8], version: Version) -> bool {
        let below = version <= self.timestamp;
        if self.scopes.is_empty() {
            return below;
        }
        self.scopes.iter().any(|scope| match scope {
            DeleteScope::Family(f) => below && f == family,
            DeleteScope::Column(f, q) => below && f == family && q == qualifier,
            DeleteScope::Version(f, q, v) => f == family && q == qualifier && *v == version,
        })
    }
}

/// Appends bytes to the current value of one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Append {
    /// Row key.
    pub row: Vec<u8>,
    /// `(family, qualifier, suffix)` triples.
    pub columns: Vec<(Vec<u8>, Vec<u8>, Vec<u8>)>,
    /// Request metadata.
    pub attributes: Attributes,
    /// Durability preference.
    pub durability: Durability,
}

impl Append {
    /// Creates an empty append.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: Vec::new(),
            attributes: Attributes::new(),
            durability: Durability::UseDefault,
        }
    }

    /// Adds a column suffix.
    pub fn add(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        suffix: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.columns
            .push((family.into(), qualifier.into(), suffix.into()));
        self
    }
}

/// Adds to 8-byte big-endian counters held in one or more columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    /// Row key.
    pub row: Vec<u8>,
    /// `(family, qualifier, amount)` triples.
    pub columns: Vec<(Vec<u8>, Vec<u8>, i64)>,
    /// Request metadata.
    pub attributes: Attributes,
    /// Durability preference.
    pub durability: Durability,
}

impl Increment {
    /// Creates an empty increment.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: Vec::new(),
            attributes: Attributes::new(),
            durability: Durability::UseDefault,
        }
    }

    /// Adds a column to increment.
    pub fn add_column(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        amount: i64,
    ) -> &mut Self {
        self.columns.push((family.into(), qualifier.into(), amount));
        self
    }
}

/// A buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A put.
    Put(Put),
    /// A delete.
    Delete(Delete),
}

impl Mutation {
    /// Returns the row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        match self {
            Self::Put(put) => &put.row,
            Self::Delete(delete) => &delete.row,
        }
    }
}

impl From<Put> for Mutation {
    fn from(put: Put) -> Self {
        Self::Put(put)
    }
}

impl From<Delete> for Mutation {
    fn from(delete: Delete) -> Self {
        Self::Delete(delete)
    }
}

/// Ordered puts and deletes against a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutations {
    row: Vec<u8>,
    mutations: Vec<Mutation>,
}

impl RowMutations {
    /// Creates an empty mutation list for `row`.
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            mutations: Vec::new(),
        }
    }

    /// Adds a mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`] if the mutation targets a
    /// different row.
    pub fn add(&mut self, mutation: impl Into<Mutation>) -> StoreResult<()> {
        let mutation = mutation.into();
        if mutation.row() != self.row.as_slice() {
            return Err(StoreError::invalid_operation(
                "mutation row does not match row mutations row",
            ));
        }
        self.mutations.push(mutation);
        Ok(())
    }

    /// Returns the row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    /// Returns the mutations in order.
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_admits_everything_by_default() {
        let filter = CellFilter::default();
        assert!(filter.admits_column(b"f", b"q"));
        assert!(filter.admits_version(Version::new(u64::MAX - 1)));
        assert_eq!(filter.max_versions, 1);
    }

    #[test]
    fn filter_ceiling_and_exclusions() {
        let get = Get::new("r")
            .with_max_version(Version::new(10))
            .with_excluded([Version::new(7)]);
        assert!(get.filter.admits_version(Version::new(10)));
        assert!(!get.filter.admits_version(Version::new(11)));
        assert!(!get.filter.admits_version(Version::new(7)));
    }

    #[test]
    fn filter_columns() {
        let get = Get::new("r").add_family("a").add_column("b", "x");
        assert!(get.filter.admits_column(b"a", b"anything"));
        assert!(get.filter.admits_column(b"b", b"x"));
        assert!(!get.filter.admits_column(b"b", b"y"));
    }

    #[test]
    fn scan_range() {
        let scan = Scan::range("b", "d");
        assert!(!scan.contains_row(b"a"));
        assert!(scan.contains_row(b"b"));
        assert!(scan.contains_row(b"c"));
        assert!(!scan.contains_row(b"d"));
        assert!(Scan::new().contains_row(b"zzz"));
    }

    #[test]
    fn put_uses_its_timestamp() {
        let mut put = Put::with_timestamp("r", Version::new(5));
        put.add("f", "a", "1").add_at("f", "b", Version::new(9), "2");
        assert_eq!(put.cells[0].timestamp, Version::new(5));
        assert_eq!(put.cells[1].timestamp, Version::new(9));
    }

    #[test]
    fn delete_coverage() {
        let row = Delete::with_timestamp("r", Version::new(5));
        assert!(row.covers(b"f", b"q", Version::new(5)));
        assert!(!row.covers(b"f", b"q", Version::new(6)));

        let mut column = Delete::with_timestamp("r", Version::new(5));
        column.delete_column("f", "q");
        assert!(column.covers(b"f", b"q", Version::new(1)));
        assert!(!column.covers(b"f", b"other", Version::new(1)));

        let mut exact = Delete::new("r");
        exact.delete_version("f", "q", Version::new(3));
        assert!(exact.covers(b"f", b"q", Version::new(3)));
        assert!(!exact.covers(b"f", b"q", Version::new(2)));
    }

    #[test]
    fn attributes_roundtrip() {
        let mut put = Put::new("r");
        put.set_attribute("k", b"v".to_vec());
        assert_eq!(put.attribute("k"), Some(&b"v"[..]));
        assert_eq!(put.attribute("missing"), None);
    }

    #[test]
    fn row_mutations_reject_other_rows() {
        let mut rm = RowMutations::new("r");
        rm.add(Put::new("r")).unwrap();
        rm.add(Delete::new("r")).unwrap();
        assert!(rm.add(Put::new("other")).is_err());
        assert_eq!(rm.mutations().len(), 2);
    }
}

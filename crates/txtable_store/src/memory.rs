//! In-memory reference store.

use crate::backend::CellStore;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::ops::{Append, CellFilter, Delete, Get, Increment, Mutation, Put, Scan};
use crate::types::{decode_counter, encode_counter, Cell, RowResult, Version};
use parking_lot::{Mutex, RwLock};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::trace;

/// Versions of one column, newest first.
type Versions = BTreeMap<Reverse<Version>, Vec<u8>>;

/// Columns of one row keyed by `(family, qualifier)`.
type Columns = BTreeMap<(Vec<u8>, Vec<u8>), Versions>;

/// An in-memory versioned cell store.
///
/// This store keeps every row in a sorted map and is suitable for:
/// - Unit and integration tests
/// - Demos and embedded use where persistence is not needed
///
/// Deletes remove cells physically, so a later put at an older timestamp
/// becomes visible again. Timestamps requested as [`Version::LATEST`] are
/// taken from a clock that always runs ahead of every version written so far.
///
/// # Thread Safety
///
/// The store is thread-safe and can be shared across threads, typically
/// behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use txtable_store::{CellStore, Delete, Get, InMemoryStore, Put, Version};
///
/// let store = InMemoryStore::new();
/// let mut put = Put::with_timestamp("r", Version::new(3));
/// put.add("f", "c", "v");
/// store.put(&put).unwrap();
///
/// store.delete(&Delete::new("r")).unwrap();
/// assert!(store.get(&Get::new("r")).unwrap().is_empty());
/// ```
#[derive(Debug)]
pub struct InMemoryStore {
    name: String,
    config: StoreConfig,
    rows: RwLock<BTreeMap<Vec<u8>, Columns>>,
    write_buffer: Mutex<Vec<Mutation>>,
    clock: AtomicU64,
    closed: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_config("memory", StoreConfig::default())
    }
}

impl InMemoryStore {
    /// Creates a new empty store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store with a table name and configuration.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: StoreConfig) -> Self {
        Self {
            name: name.into(),
            config,
            rows: RwLock::new(BTreeMap::new()),
            write_buffer: Mutex::new(Vec::new()),
            clock: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the number of mutations waiting in the write buffer.
    #[must_use]
    pub fn buffered_count(&self) -> usize {
        self.write_buffer.lock().len()
    }

    /// Returns the number of rows holding at least one cell.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if [`CellStore::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns every stored version of a row, ignoring visibility.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn raw_row(&self, row: &[u8]) -> RowResult {
        let rows = self.rows.read();
        let cells = rows
            .get(row)
            .map(|columns| {
                columns
                    .iter()
                    .flat_map(|((family, qualifier), versions)| {
                        versions.iter().map(move |(Reverse(ts), value)| {
                            Cell::new(family.clone(), qualifier.clone(), *ts, value.clone())
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        RowResult::new(row, cells)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn resolve_timestamp(&self, timestamp: Version) -> Version {
        if timestamp.is_latest() {
            Version::new(self.clock.fetch_add(1, Ordering::SeqCst))
        } else {
            // Keep the clock ahead of explicit versions
            self.clock
                .fetch_max(timestamp.as_u64().saturating_add(1), Ordering::SeqCst);
            timestamp
        }
    }

    fn buffer_or_apply(&self, mutation: Mutation) -> StoreResult<()> {
        if self.config.auto_flush {
            let mut rows = self.rows.write();
            self.apply(&mut rows, &mutation);
            return Ok(());
        }

        let full = {
            let mut buffer = self.write_buffer.lock();
            buffer.push(mutation);
            buffer.len() >= self.config.write_buffer_size
        };
        if full {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&self) -> StoreResult<()> {
        let pending = std::mem::take(&mut *self.write_buffer.lock());
        if pending.is_empty() {
            return Ok(());
        }
        trace!(table = %self.name, mutations = pending.len(), "flushing write buffer");
        let mut rows = self.rows.write();
        for mutation in &pending {
            self.apply(&mut rows, mutation);
        }
        Ok(())
    }

    fn apply(&self, rows: &mut BTreeMap<Vec<u8>, Columns>, mutation: &Mutation) {
        match mutation {
            Mutation::Put(put) => self.apply_put(rows, put),
            Mutation::Delete(delete) => apply_delete(rows, delete),
        }
    }

    fn apply_put(&self, rows: &mut BTreeMap<Vec<u8>, Columns>, put: &Put) {
        // All store-assigned cells of one put share a timestamp
        let mut assigned = None;
        let columns = rows.entry(put.row.clone()).or_default();
        for cell in &put.cells {
            let timestamp = if cell.timestamp.is_latest() {
                *assigned.get_or_insert_with(|| self.resolve_timestamp(Version::LATEST))
            } else {
                self.resolve_timestamp(cell.timestamp)
            };
            columns
                .entry((cell.family.clone(), cell.qualifier.clone()))
                .or_default()
                .insert(Reverse(timestamp), cell.value.clone());
        }
    }

    fn check_row(row: &[u8], target: &[u8]) -> StoreResult<()> {
        if row != target {
            return Err(StoreError::invalid_operation(
                "checked mutation must target the checked row",
            ));
        }
        Ok(())
    }
}

/// Reads the cells of one row that pass `filter`.
fn read_row(row: &[u8], columns: &Columns, filter: &CellFilter) -> RowResult {
    let limit = filter.max_versions as usize;
    let mut cells = Vec::new();
    for ((family, qualifier), versions) in columns {
        if !filter.admits_column(family, qualifier) {
            continue;
        }
        cells.extend(
            versions
                .iter()
                .filter(|(Reverse(ts), _)| filter.admits_version(*ts))
                .take(limit)
                .map(|(Reverse(ts), value)| {
                    Cell::new(family.clone(), qualifier.clone(), *ts, value.clone())
                }),
        );
    }
    RowResult::new(row, cells)
}

fn newest_value<'a>(
    columns: Option<&'a Columns>,
    family: &[u8],
    qualifier: &[u8],
) -> Option<&'a [u8]> {
    columns?
        .get(&(family.to_vec(), qualifier.to_vec()))?
        .values()
        .next()
        .map(Vec::as_slice)
}

fn apply_delete(rows: &mut BTreeMap<Vec<u8>, Columns>, delete: &Delete) {
    let Some(columns) = rows.get_mut(&delete.row) else {
        return;
    };
    for ((family, qualifier), versions) in columns.iter_mut() {
        versions.retain(|Reverse(ts), _| !delete.covers(family, qualifier, *ts));
    }
    columns.retain(|_, versions| !versions.is_empty());
    if columns.is_empty() {
        rows.remove(&delete.row);
    }
}

impl CellStore for InMemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, get: &Get) -> StoreResult<RowResult> {
        self.ensure_open()?;
        let rows = self.rows.read();
        Ok(match rows.get(&get.row) {
            Some(columns) => read_row(&get.row, columns, &get.filter),
            None => RowResult::empty(get.row.clone()),
        })
    }

    fn scan(&self, scan: &Scan) -> StoreResult<Vec<RowResult>> {
        self.ensure_open()?;
        let rows = self.rows.read();
        Ok(rows
            .range(scan.start_row.clone()..)
            .take_while(|(row, _)| scan.contains_row(row))
            .map(|(row, columns)| read_row(row, columns, &scan.filter))
            .filter(|result| !result.is_empty())
            .collect())
    }

    fn put(&self, put: &Put) -> StoreResult<()> {
        self.ensure_open()?;
        if put.is_empty() {
            return Err(StoreError::invalid_operation("put has no cells"));
        }
        self.buffer_or_apply(Mutation::Put(put.clone()))
    }

    fn delete(&self, delete: &Delete) -> StoreResult<()> {
        self.ensure_open()?;
        self.buffer_or_apply(Mutation::Delete(delete.clone()))
    }

    fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> StoreResult<bool> {
        self.ensure_open()?;
        Self::check_row(row, &put.row)?;
        if put.is_empty() {
            return Err(StoreError::invalid_operation("put has no cells"));
        }
        let mut rows = self.rows.write();
        if newest_value(rows.get(row), family, qualifier) != expected {
            return Ok(false);
        }
        self.apply_put(&mut rows, put);
        Ok(true)
    }

    fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> StoreResult<bool> {
        self.ensure_open()?;
        Self::check_row(row, &delete.row)?;
        let mut rows = self.rows.write();
        if newest_value(rows.get(row), family, qualifier) != expected {
            return Ok(false);
        }
        apply_delete(&mut rows, delete);
        Ok(true)
    }

    fn append(&self, append: &Append) -> StoreResult<RowResult> {
        self.ensure_open()?;
        let mut rows = self.rows.write();
        let timestamp = self.resolve_timestamp(Version::LATEST);
        let mut written = Put::with_timestamp(append.row.clone(), timestamp);
        for (family, qualifier, suffix) in &append.columns {
            let mut value = newest_value(rows.get(&append.row), family, qualifier)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            value.extend_from_slice(suffix);
            written.add(family.clone(), qualifier.clone(), value);
        }
        self.apply_put(&mut rows, &written);
        Ok(RowResult::new(written.row, written.cells))
    }

    fn increment(&self, increment: &Increment) -> StoreResult<RowResult> {
        self.ensure_open()?;
        let mut rows = self.rows.write();
        let timestamp = self.resolve_timestamp(Version::LATEST);
        let mut written = Put::with_timestamp(increment.row.clone(), timestamp);
        for (family, qualifier, amount) in &increment.columns {
            let current = newest_value(rows.get(&increment.row), family, qualifier)
                .map(decode_counter)
                .transpose()?
                .unwrap_or(0);
            let next = current.checked_add(*amount).ok_or_else(|| {
                StoreError::invalid_value(format!("increment of {current} by {amount} overflows"))
            })?;
            written.add(family.clone(), qualifier.clone(), encode_counter(next));
        }
        self.apply_put(&mut rows, &written);
        Ok(RowResult::new(written.row, written.cells))
    }

    fn flush(&self) -> StoreResult<()> {
        self.ensure_open()?;
        self.flush_buffer()
    }

    fn close(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.flush_buffer()?;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(row: &str, ts: u64, family: &str, qualifier: &str, value: &str) -> Put {
        let mut put = Put::with_timestamp(row, Version::new(ts));
        put.add(family, qualifier, value);
        put
    }

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert_eq!(store.row_count(), 0);
        assert_eq!(store.name(), "memory");
        assert!(store.get(&Get::new("r")).unwrap().is_empty());
    }

    #[test]
    fn memory_get_returns_newest_version() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "c", "old")).unwrap();
        store.put(&put("r", 2, "f", "c", "new")).unwrap();

        let result = store.get(&Get::new("r")).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.value(b"f", b"c"), Some(&b"new"[..]));

        let all = store.get(&Get::new("r").with_max_versions(10)).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn memory_get_honours_ceiling_and_exclusions() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "c", "one")).unwrap();
        store.put(&put("r", 2, "f", "c", "two")).unwrap();
        store.put(&put("r", 3, "f", "c", "three")).unwrap();

        let get = Get::new("r")
            .with_max_version(Version::new(3))
            .with_excluded([Version::new(3), Version::new(2)]);
        let result = store.get(&get).unwrap();
        assert_eq!(result.value(b"f", b"c"), Some(&b"one"[..]));

        let get = Get::new("r").with_max_version(Version::new(0));
        assert!(store.get(&get).unwrap().is_empty());
    }

    #[test]
    fn memory_latest_timestamp_runs_ahead_of_explicit_versions() {
        let store = InMemoryStore::new();
        store.put(&put("r", 100, "f", "c", "explicit")).unwrap();

        let mut latest = Put::new("r");
        latest.add("f", "c", "assigned");
        store.put(&latest).unwrap();

        let result = store.get(&Get::new("r")).unwrap();
        let cell = result.latest(b"f", b"c").unwrap();
        assert_eq!(cell.value, b"assigned");
        assert!(cell.timestamp > Version::new(100));
    }

    #[test]
    fn memory_scan_respects_range_and_columns() {
        let store = InMemoryStore::new();
        for row in ["a", "b", "c", "d"] {
            store.put(&put(row, 1, "f", "x", row)).unwrap();
        }
        store.put(&put("b", 1, "g", "y", "other")).unwrap();

        let rows = store.scan(&Scan::range("b", "d")).unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.row().to_vec()).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(rows[0].len(), 2);

        let rows = store.scan(&Scan::new().add_family("g")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row(), b"b");
    }

    #[test]
    fn memory_delete_scopes() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "a", "a1")).unwrap();
        store.put(&put("r", 5, "f", "a", "a5")).unwrap();
        store.put(&put("r", 1, "f", "b", "b1")).unwrap();

        let mut exact = Delete::new("r");
        exact.delete_version("f", "a", Version::new(5));
        store.delete(&exact).unwrap();
        assert_eq!(
            store.get(&Get::new("r")).unwrap().value(b"f", b"a"),
            Some(&b"a1"[..])
        );

        store
            .delete(&Delete::with_timestamp("r", Version::new(1)))
            .unwrap();
        assert!(store.get(&Get::new("r")).unwrap().is_empty());
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn memory_put_without_cells_fails() {
        let store = InMemoryStore::new();
        let result = store.put(&Put::new("r"));
        assert!(matches!(result, Err(StoreError::InvalidOperation { .. })));
    }

    #[test]
    fn memory_write_buffer_defers_until_flush() {
        let store = InMemoryStore::with_config("t", StoreConfig::new().auto_flush(false));
        store.put(&put("r", 1, "f", "c", "v")).unwrap();
        assert_eq!(store.buffered_count(), 1);
        assert!(store.get(&Get::new("r")).unwrap().is_empty());

        store.flush().unwrap();
        assert_eq!(store.buffered_count(), 0);
        assert_eq!(
            store.get(&Get::new("r")).unwrap().value(b"f", b"c"),
            Some(&b"v"[..])
        );
    }

    #[test]
    fn memory_write_buffer_flushes_when_full() {
        let config = StoreConfig::new().auto_flush(false).write_buffer_size(2);
        let store = InMemoryStore::with_config("t", config);
        store.put(&put("a", 1, "f", "c", "v")).unwrap();
        assert_eq!(store.row_count(), 0);
        store.put(&put("b", 1, "f", "c", "v")).unwrap();
        assert_eq!(store.buffered_count(), 0);
        assert_eq!(store.row_count(), 2);
    }

    #[test]
    fn memory_check_and_put() {
        let store = InMemoryStore::new();
        let first = put("r", 1, "f", "c", "v1");

        assert!(store.check_and_put(b"r", b"f", b"c", None, &first).unwrap());
        assert!(!store.check_and_put(b"r", b"f", b"c", None, &first).unwrap());

        let second = put("r", 2, "f", "c", "v2");
        assert!(store
            .check_and_put(b"r", b"f", b"c", Some(b"v1"), &second)
            .unwrap());
        assert_eq!(
            store.get(&Get::new("r")).unwrap().value(b"f", b"c"),
            Some(&b"v2"[..])
        );
    }

    #[test]
    fn memory_check_and_put_rejects_other_row() {
        let store = InMemoryStore::new();
        let result = store.check_and_put(b"r", b"f", b"c", None, &put("x", 1, "f", "c", "v"));
        assert!(matches!(result, Err(StoreError::InvalidOperation { .. })));
    }

    #[test]
    fn memory_check_and_delete() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "c", "v1")).unwrap();

        let delete = Delete::new("r");
        assert!(!store
            .check_and_delete(b"r", b"f", b"c", Some(b"nope"), &delete)
            .unwrap());
        assert!(store
            .check_and_delete(b"r", b"f", b"c", Some(b"v1"), &delete)
            .unwrap());
        assert!(store.get(&Get::new("r")).unwrap().is_empty());
    }

    #[test]
    fn memory_append_concatenates() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "c", "ab")).unwrap();

        let mut append = Append::new("r");
        append.add("f", "c", "cd");
        let result = store.append(&append).unwrap();
        assert_eq!(result.value(b"f", b"c"), Some(&b"abcd"[..]));
        assert_eq!(
            store.get(&Get::new("r")).unwrap().value(b"f", b"c"),
            Some(&b"abcd"[..])
        );
    }

    #[test]
    fn memory_increment_counts() {
        let store = InMemoryStore::new();
        let mut increment = Increment::new("r");
        increment.add_column("f", "n", 5);

        store.increment(&increment).unwrap();
        let result = store.increment(&increment).unwrap();
        assert_eq!(decode_counter(result.value(b"f", b"n").unwrap()).unwrap(), 10);
    }

    #[test]
    fn memory_increment_rejects_non_counter() {
        let store = InMemoryStore::new();
        store.put(&put("r", 1, "f", "n", "text")).unwrap();
        let mut increment = Increment::new("r");
        increment.add_column("f", "n", 1);
        assert!(matches!(
            store.increment(&increment),
            Err(StoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn memory_close_flushes_and_rejects_later_calls() {
        let store = InMemoryStore::with_config("t", StoreConfig::new().auto_flush(false));
        store.put(&put("r", 1, "f", "c", "v")).unwrap();
        store.close().unwrap();

        assert!(store.is_closed());
        assert_eq!(store.raw_row(b"r").len(), 1);
        assert!(matches!(store.get(&Get::new("r")), Err(StoreError::Closed)));
        assert!(matches!(store.flush(), Err(StoreError::Closed)));
        assert!(store.close().is_ok());
    }

    #[test]
    fn memory_shared_through_arc() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let handle: std::sync::Arc<dyn CellStore> = store.clone();
        handle.put(&put("r", 1, "f", "c", "v")).unwrap();
        assert_eq!(store.row_count(), 1);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn get_returns_newest_admitted_version(
                versions in prop::collection::btree_set(1u64..64, 1..16),
                ceiling in 0u64..70,
                excluded in prop::collection::btree_set(1u64..64, 0..8),
            ) {
                let store = InMemoryStore::new();
                for v in &versions {
                    store.put(&put("r", *v, "f", "c", &v.to_string())).unwrap();
                }

                let get = Get::new("r")
                    .with_max_version(Version::new(ceiling))
                    .with_excluded(excluded.iter().copied().map(Version::new));
                let result = store.get(&get).unwrap();

                let expected = versions
                    .iter()
                    .rev()
                    .find(|v| **v <= ceiling && !excluded.contains(*v));
                let seen = result.latest(b"f", b"c").map(|c| c.timestamp.as_u64());
                prop_assert_eq!(seen, expected.copied());
            }
        }
    }
}

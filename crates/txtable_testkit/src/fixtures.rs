//! Test fixtures.
//!
//! Most tests touch a single column, `f:c`, so the helpers here default to it.

use txtable_codec::Transaction;
use txtable_core::TransactionAwareTable;
use txtable_store::{CellStore, Get, InMemoryStore, Put, RowResult, Scan, Version};

/// Default column family.
pub const FAMILY: &[u8] = b"f";

/// Default column qualifier.
pub const QUALIFIER: &[u8] = b"c";

/// Builds a transaction from raw pointers.
#[must_use]
pub fn tx(read_pointer: u64, write_pointer: u64, excluded: &[u64]) -> Transaction {
    Transaction::new(
        Version::new(read_pointer),
        Version::new(write_pointer),
        excluded.iter().copied().map(Version::new),
    )
}

/// Builds a put of `f:c` at an explicit version.
#[must_use]
pub fn cell_put(row: &str, version: u64, value: &str) -> Put {
    let mut put = Put::with_timestamp(row, Version::new(version));
    put.add(FAMILY, QUALIFIER, value);
    put
}

/// Builds a put of `f:c` whose version the table will assign.
#[must_use]
pub fn value_put(row: &str, value: &str) -> Put {
    let mut put = Put::new(row);
    put.add(FAMILY, QUALIFIER, value);
    put
}

/// Creates an in-memory store holding `(row, version, value)` cells in `f:c`.
#[must_use]
pub fn seeded_store(cells: &[(&str, u64, &str)]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for (row, version, value) in cells {
        store
            .put(&cell_put(row, *version, value))
            .expect("Failed to seed store");
    }
    store
}

/// Returns every version of every row, ignoring visibility.
#[must_use]
pub fn dump<S: CellStore + ?Sized>(store: &S) -> Vec<RowResult> {
    store
        .scan(&Scan::new().with_max_versions(u32::MAX))
        .expect("Failed to scan store")
}

/// Reads the newest visible `f:c` value of a row through a bound table.
pub fn read_value<S: CellStore>(table: &mut TransactionAwareTable<S>, row: &str) -> Option<Vec<u8>> {
    table
        .get(&Get::new(row).add_column(FAMILY, QUALIFIER))
        .expect("Failed to read row")
        .value(FAMILY, QUALIFIER)
        .map(<[u8]>::to_vec)
}

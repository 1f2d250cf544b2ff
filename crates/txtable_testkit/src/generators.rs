//! Property-based test generators using proptest.
//!
//! Rows, qualifiers and values are drawn from small pools so that generated
//! operations collide on the same cells often.

use crate::fixtures::FAMILY;
use proptest::prelude::*;
use txtable_codec::Transaction;
use txtable_core::{CoreResult, TransactionAwareTable};
use txtable_store::{CellStore, Delete, InMemoryStore, Put, Version};

const ROWS: &[&str] = &["r0", "r1", "r2", "r3"];
const QUALIFIERS: &[&str] = &["a", "b", "c"];

/// Strategy for transactions whose excluded versions never exceed the
/// write pointer.
pub fn transaction_strategy() -> impl Strategy<Value = Transaction> {
    (
        1u64..1_000_000,
        0u64..1_000,
        prop::collection::vec(any::<u64>(), 0..16),
    )
        .prop_map(|(wp, lag, excluded)| {
            Transaction::new(
                Version::new(wp.saturating_sub(lag)),
                Version::new(wp),
                excluded.into_iter().map(|v| Version::new(v % (wp + 1))),
            )
        })
}

/// Strategy for row keys.
pub fn row_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(ROWS).prop_map(str::to_string)
}

/// Strategy for qualifiers in the default family.
pub fn qualifier_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(QUALIFIERS).prop_map(str::to_string)
}

/// Strategy for short cell values.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..8)
}

/// A cell written to the store before a transaction starts.
#[derive(Debug, Clone)]
pub struct SeedCell {
    /// Row key.
    pub row: String,
    /// Qualifier in the default family.
    pub qualifier: String,
    /// Cell version.
    pub version: u64,
    /// Cell value.
    pub value: Vec<u8>,
}

/// Strategy for pre-existing cells with versions in `1..=max_version`.
pub fn seed_strategy(max_version: u64) -> impl Strategy<Value = Vec<SeedCell>> {
    prop::collection::vec(
        (
            row_strategy(),
            qualifier_strategy(),
            1..=max_version,
            value_strategy(),
        )
            .prop_map(|(row, qualifier, version, value)| SeedCell {
                row,
                qualifier,
                version,
                value,
            }),
        0..12,
    )
}

/// Creates an in-memory store holding the given cells.
#[must_use]
pub fn store_from_seed(cells: &[SeedCell]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for cell in cells {
        let mut put = Put::with_timestamp(cell.row.as_str(), Version::new(cell.version));
        put.add(FAMILY, cell.qualifier.as_str(), cell.value.clone());
        store.put(&put).expect("Failed to seed store");
    }
    store
}

/// A transactional write.
#[derive(Debug, Clone)]
pub enum TxOp {
    /// Put one cell.
    Put {
        /// Row key.
        row: String,
        /// Qualifier in the default family.
        qualifier: String,
        /// Value.
        value: Vec<u8>,
    },
    /// Delete a whole row.
    DeleteRow {
        /// Row key.
        row: String,
    },
    /// Delete one column.
    DeleteColumn {
        /// Row key.
        row: String,
        /// Qualifier in the default family.
        qualifier: String,
    },
    /// Delete the default family.
    DeleteFamily {
        /// Row key.
        row: String,
    },
}

impl TxOp {
    /// Issues the operation against a bound table.
    ///
    /// # Errors
    ///
    /// Returns the table's error.
    pub fn apply<S: CellStore>(&self, table: &mut TransactionAwareTable<S>) -> CoreResult<()> {
        match self {
            Self::Put {
                row,
                qualifier,
                value,
            } => {
                let mut put = Put::new(row.as_str());
                put.add(FAMILY, qualifier.as_str(), value.clone());
                table.put(&put)
            }
            Self::DeleteRow { row } => table.delete(&Delete::new(row.as_str())),
            Self::DeleteColumn { row, qualifier } => {
                let mut delete = Delete::new(row.as_str());
                delete.delete_column(FAMILY, qualifier.as_str());
                table.delete(&delete)
            }
            Self::DeleteFamily { row } => {
                let mut delete = Delete::new(row.as_str());
                delete.delete_family(FAMILY);
                table.delete(&delete)
            }
        }
    }
}

/// Strategy for transactional writes.
pub fn tx_op_strategy() -> impl Strategy<Value = TxOp> {
    prop_oneof![
        3 => (row_strategy(), qualifier_strategy(), value_strategy())
            .prop_map(|(row, qualifier, value)| TxOp::Put { row, qualifier, value }),
        1 => row_strategy().prop_map(|row| TxOp::DeleteRow { row }),
        1 => (row_strategy(), qualifier_strategy())
            .prop_map(|(row, qualifier)| TxOp::DeleteColumn { row, qualifier }),
        1 => row_strategy().prop_map(|row| TxOp::DeleteFamily { row }),
    ]
}

/// Strategy for a sequence of transactional writes.
pub fn tx_op_sequence_strategy(min_ops: usize, max_ops: usize) -> impl Strategy<Value = Vec<TxOp>> {
    prop::collection::vec(tx_op_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

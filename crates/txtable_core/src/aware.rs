//! The participant interface a transaction coordinator drives.

use crate::error::CoreResult;
use crate::table::TransactionAwareTable;
use txtable_codec::Transaction;
use txtable_store::CellStore;

/// A resource that takes part in coordinator-managed transactions.
///
/// The coordinator calls, in order:
/// 1. [`start_tx`](Self::start_tx) with the transaction it issued
/// 2. [`tx_changes`](Self::tx_changes) to collect the change set for
///    conflict detection
/// 3. [`commit_tx`](Self::commit_tx) to make the writes durable
/// 4. [`post_tx_commit`](Self::post_tx_commit) once the commit is recorded,
///    or [`rollback_tx`](Self::rollback_tx) if anything went wrong
pub trait TransactionAware {
    /// Starts participating in `tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the participant cannot take the transaction.
    fn start_tx(&mut self, tx: Transaction) -> CoreResult<()>;

    /// Returns the change set of the current transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction is active.
    fn tx_changes(&self) -> CoreResult<Vec<Vec<u8>>>;

    /// Persists the transaction's writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the writes could not be persisted.
    fn commit_tx(&mut self) -> CoreResult<()>;

    /// Releases the transaction after a successful commit.
    fn post_tx_commit(&mut self);

    /// Undoes the transaction's writes and releases it.
    ///
    /// # Errors
    ///
    /// Returns an error if some writes could not be undone.
    fn rollback_tx(&mut self) -> CoreResult<()>;

    /// Returns a name identifying this participant.
    fn transaction_aware_name(&self) -> String;
}

impl<S: CellStore> TransactionAware for TransactionAwareTable<S> {
    fn start_tx(&mut self, tx: Transaction) -> CoreResult<()> {
        self.bind(tx)
    }

    fn tx_changes(&self) -> CoreResult<Vec<Vec<u8>>> {
        TransactionAwareTable::tx_changes(self)
    }

    fn commit_tx(&mut self) -> CoreResult<()> {
        TransactionAwareTable::commit_tx(self)
    }

    fn post_tx_commit(&mut self) {
        TransactionAwareTable::post_tx_commit(self);
    }

    fn rollback_tx(&mut self) -> CoreResult<()> {
        TransactionAwareTable::rollback_tx(self)
    }

    fn transaction_aware_name(&self) -> String {
        self.name().to_string()
    }
}

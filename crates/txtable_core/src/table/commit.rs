//! Commit and rollback of the bound transaction.

use super::{rewrite, TransactionAwareTable};
use crate::error::{CoreError, CoreResult};
use crate::log::PendingMutation;
use tracing::{debug, warn};
use txtable_codec::Transaction;
use txtable_store::CellStore;

impl<S: CellStore> TransactionAwareTable<S> {
    /// Applies the buffered writes to the store, oldest first, then flushes.
    ///
    /// On failure the transaction stays bound with its log intact, so the
    /// call can be retried or followed by [`rollback_tx`](Self::rollback_tx).
    /// Replaying is idempotent because every write carries the write pointer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the first
    /// store failure.
    pub fn commit_tx(&mut self) -> CoreResult<()> {
        let tx = self.bound()?;
        debug!(
            table = %self.name(),
            write_pointer = tx.write_pointer().as_u64(),
            entries = self.log.len(),
            "committing transaction"
        );

        for entry in &self.log {
            let applied = match entry {
                PendingMutation::Get(_) => Ok(()),
                PendingMutation::Put(put) => self.store.put(put),
                PendingMutation::Delete { delete, .. } => self.store.delete(delete),
            };
            if let Err(err) = applied {
                warn!(
                    table = %self.name(),
                    write_pointer = tx.write_pointer().as_u64(),
                    row = ?entry.row(),
                    kind = entry.kind(),
                    error = %err,
                    "commit failed, transaction stays bound"
                );
                return Err(err.into());
            }
        }

        if let Err(err) = self.store.flush() {
            warn!(
                table = %self.name(),
                write_pointer = tx.write_pointer().as_u64(),
                error = %err,
                "flush failed during commit, transaction stays bound"
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Forgets the transaction and its log after the coordinator has made
    /// the commit durable.
    pub fn post_tx_commit(&mut self) {
        if let Some(tx) = &self.tx {
            debug!(
                table = %self.name(),
                write_pointer = tx.write_pointer().as_u64(),
                "transaction committed"
            );
        }
        self.unbind();
    }

    /// Undoes the transaction's writes and unbinds it.
    ///
    /// Entries are compensated newest first: a buffered put becomes a delete
    /// of exactly the versions it wrote, and a buffered delete becomes a put
    /// of every cell it could remove, including cells hidden from the
    /// snapshot. A failed action is logged and rollback moves on.
    /// The store is then flushed and the table unbound, whatever happened.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotBound`] without a transaction
    /// - [`CoreError::RollbackPartialFailure`] if any action or the flush
    ///   failed; the table is already unbound when this is returned
    pub fn rollback_tx(&mut self) -> CoreResult<()> {
        let tx = self.bound()?.clone();
        debug!(
            table = %self.name(),
            write_pointer = tx.write_pointer().as_u64(),
            entries = self.log.len(),
            "rolling back transaction"
        );

        let mut failed = 0;
        let mut first = None;
        for entry in self.log.iter().rev() {
            if let Err(err) = self.compensate(&tx, entry) {
                warn!(
                    table = %self.name(),
                    write_pointer = tx.write_pointer().as_u64(),
                    row = ?entry.row(),
                    kind = entry.kind(),
                    error = %err,
                    "compensating action failed"
                );
                failed += 1;
                if first.is_none() {
                    first = Some(err);
                }
            }
        }

        if let Err(err) = self.store.flush() {
            warn!(
                table = %self.name(),
                write_pointer = tx.write_pointer().as_u64(),
                error = %err,
                "flush failed during rollback"
            );
            failed += 1;
            if first.is_none() {
                first = Some(err.into());
            }
        }

        self.unbind();
        match first {
            None => Ok(()),
            Some(first) => Err(CoreError::RollbackPartialFailure {
                failed,
                first: Box::new(first),
            }),
        }
    }

    fn compensate(&self, tx: &Transaction, entry: &PendingMutation) -> CoreResult<()> {
        match entry {
            PendingMutation::Get(_) => {}
            PendingMutation::Put(put) => {
                self.store.delete(&rewrite::compensating_delete(tx, put)?)?;
            }
            PendingMutation::Delete { undo_image, .. } => {
                if let Some(put) = rewrite::compensating_put(tx, undo_image)? {
                    self.store.put(&put)?;
                }
            }
        }
        Ok(())
    }
}

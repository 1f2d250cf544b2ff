//! A minimal in-process transaction coordinator.
//!
//! Hands out snapshot transactions and drives participants through commit
//! or rollback. There is no conflict detection: change sets are only
//! recorded.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use txtable_codec::Transaction;
use txtable_core::{CoreResult, TransactionAware};
use txtable_store::Version;

/// Issues transactions and tracks their outcome.
///
/// Each transaction reads everything written before it started, except the
/// writes of transactions still in progress or invalidated by a failed
/// rollback.
#[derive(Debug)]
pub struct Coordinator {
    next_write_pointer: AtomicU64,
    in_progress: RwLock<BTreeSet<Version>>,
    invalid: RwLock<BTreeSet<Version>>,
    committed: RwLock<Vec<(Version, Vec<Vec<u8>>)>>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl Coordinator {
    /// Creates a coordinator whose first write pointer is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a coordinator whose first write pointer is `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next_write_pointer: AtomicU64::new(first.max(1)),
            in_progress: RwLock::new(BTreeSet::new()),
            invalid: RwLock::new(BTreeSet::new()),
            committed: RwLock::new(Vec::new()),
        }
    }

    /// Starts a new transaction.
    pub fn begin(&self) -> Transaction {
        let wp = Version::new(self.next_write_pointer.fetch_add(1, Ordering::SeqCst));
        let mut in_progress = self.in_progress.write();
        let excluded: Vec<Version> = in_progress
            .iter()
            .chain(self.invalid.read().iter())
            .copied()
            .collect();
        in_progress.insert(wp);
        Transaction::new(Version::new(wp.as_u64() - 1), wp, excluded)
    }

    /// Commits `tx` on a participant.
    ///
    /// Collects the change set, commits, then confirms with
    /// `post_tx_commit`. If the commit fails the participant is rolled back
    /// and the commit error is returned.
    ///
    /// # Errors
    ///
    /// Returns the participant's failure.
    pub fn commit<P>(&self, tx: &Transaction, participant: &mut P) -> CoreResult<()>
    where
        P: TransactionAware + ?Sized,
    {
        let changes = participant.tx_changes()?;
        if let Err(err) = participant.commit_tx() {
            // the commit error is what the caller needs to see
            let _ = self.abort(tx, participant);
            return Err(err);
        }
        self.in_progress.write().remove(&tx.write_pointer());
        self.committed.write().push((tx.write_pointer(), changes));
        participant.post_tx_commit();
        Ok(())
    }

    /// Rolls `tx` back on a participant.
    ///
    /// A transaction whose rollback fails is marked invalid and stays
    /// excluded from every later snapshot.
    ///
    /// # Errors
    ///
    /// Returns the participant's rollback failure.
    pub fn abort<P>(&self, tx: &Transaction, participant: &mut P) -> CoreResult<()>
    where
        P: TransactionAware + ?Sized,
    {
        let result = participant.rollback_tx();
        self.in_progress.write().remove(&tx.write_pointer());
        if result.is_err() {
            self.invalid.write().insert(tx.write_pointer());
        }
        result
    }

    /// Returns the transactions still in progress.
    #[must_use]
    pub fn in_progress(&self) -> BTreeSet<Version> {
        self.in_progress.read().clone()
    }

    /// Returns the transactions invalidated by failed rollbacks.
    #[must_use]
    pub fn invalid(&self) -> BTreeSet<Version> {
        self.invalid.read().clone()
    }

    /// Returns the write pointers of committed transactions, in commit order.
    #[must_use]
    pub fn committed(&self) -> Vec<Version> {
        self.committed.read().iter().map(|(wp, _)| *wp).collect()
    }

    /// Returns the change set recorded for a committed transaction.
    #[must_use]
    pub fn changes_of(&self, write_pointer: Version) -> Option<Vec<Vec<u8>>> {
        self.committed
            .read()
            .iter()
            .find(|(wp, _)| *wp == write_pointer)
            .map(|(_, changes)| changes.clone())
    }
}

//! A store wrapper that records every call and fails on demand.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use txtable_store::{
    Append, CellStore, Delete, Get, Increment, Put, RowResult, Scan, StoreError, StoreResult,
};

/// A call seen by a [`FaultInjectingStore`], with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get` (also recorded once per request of `get_many` and `exists`).
    Get(Get),
    /// `scan`
    Scan(Scan),
    /// `put`
    Put(Put),
    /// `delete`
    Delete(Delete),
    /// `check_and_put`
    CheckAndPut {
        /// Checked row.
        row: Vec<u8>,
        /// Checked family.
        family: Vec<u8>,
        /// Checked qualifier.
        qualifier: Vec<u8>,
        /// Expected value.
        expected: Option<Vec<u8>>,
        /// Put applied on match.
        put: Put,
    },
    /// `check_and_delete`
    CheckAndDelete {
        /// Checked row.
        row: Vec<u8>,
        /// Checked family.
        family: Vec<u8>,
        /// Checked qualifier.
        qualifier: Vec<u8>,
        /// Expected value.
        expected: Option<Vec<u8>>,
        /// Delete applied on match.
        delete: Delete,
    },
    /// `append`
    Append(Append),
    /// `increment`
    Increment(Increment),
    /// `flush`
    Flush,
    /// `close`
    Close,
}

impl StoreCall {
    /// Returns true for puts and deletes.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Put(_) | Self::Delete(_))
    }
}

/// Wraps a store, recording calls and failing selected ones.
///
/// Writes (puts and deletes) are numbered from zero in the order they
/// arrive. Failed calls are recorded but never reach the inner store.
#[derive(Debug)]
pub struct FaultInjectingStore<S> {
    inner: S,
    calls: Mutex<Vec<StoreCall>>,
    writes_seen: AtomicUsize,
    failing_writes: Mutex<BTreeSet<usize>>,
    fail_all_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_flush: AtomicBool,
}

impl<S: CellStore> FaultInjectingStore<S> {
    /// Wraps `inner` with no faults armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            writes_seen: AtomicUsize::new(0),
            failing_writes: Mutex::new(BTreeSet::new()),
            fail_all_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_flush: AtomicBool::new(false),
        }
    }

    /// Fails the write with sequence number `n` (zero-based, counted since
    /// the store was created).
    pub fn fail_write(&self, n: usize) {
        self.failing_writes.lock().insert(n);
    }

    /// Fails every write while `fail` is set.
    pub fn fail_all_writes(&self, fail: bool) {
        self.fail_all_writes.store(fail, Ordering::SeqCst);
    }

    /// Fails every get and scan while `fail` is set.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Fails every flush while `fail` is set.
    pub fn fail_flush(&self, fail: bool) {
        self.fail_flush.store(fail, Ordering::SeqCst);
    }

    /// Returns every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Returns the recorded puts and deletes.
    #[must_use]
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls.lock().iter().filter(|c| c.is_write()).cloned().collect()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }

    fn injected(what: &str) -> StoreError {
        StoreError::unavailable(format!("injected {what} failure"))
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected("read"));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        let n = self.writes_seen.fetch_add(1, Ordering::SeqCst);
        if self.fail_all_writes.load(Ordering::SeqCst) || self.failing_writes.lock().remove(&n) {
            return Err(Self::injected("write"));
        }
        Ok(())
    }
}

impl<S: CellStore> CellStore for FaultInjectingStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, get: &Get) -> StoreResult<RowResult> {
        self.record(StoreCall::Get(get.clone()));
        self.check_read()?;
        self.inner.get(get)
    }

    fn scan(&self, scan: &Scan) -> StoreResult<Vec<RowResult>> {
        self.record(StoreCall::Scan(scan.clone()));
        self.check_read()?;
        self.inner.scan(scan)
    }

    fn put(&self, put: &Put) -> StoreResult<()> {
        self.record(StoreCall::Put(put.clone()));
        self.check_write()?;
        self.inner.put(put)
    }

    fn delete(&self, delete: &Delete) -> StoreResult<()> {
        self.record(StoreCall::Delete(delete.clone()));
        self.check_write()?;
        self.inner.delete(delete)
    }

    fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> StoreResult<bool> {
        self.record(StoreCall::CheckAndPut {
            row: row.to_vec(),
            family: family.to_vec(),
            qualifier: qualifier.to_vec(),
            expected: expected.map(<[u8]>::to_vec),
            put: put.clone(),
        });
        self.inner
            .check_and_put(row, family, qualifier, expected, put)
    }

    fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> StoreResult<bool> {
        self.record(StoreCall::CheckAndDelete {
            row: row.to_vec(),
            family: family.to_vec(),
            qualifier: qualifier.to_vec(),
            expected: expected.map(<[u8]>::to_vec),
            delete: delete.clone(),
        });
        self.inner
            .check_and_delete(row, family, qualifier, expected, delete)
    }

    fn append(&self, append: &Append) -> StoreResult<RowResult> {
        self.record(StoreCall::Append(append.clone()));
        self.inner.append(append)
    }

    fn increment(&self, increment: &Increment) -> StoreResult<RowResult> {
        self.record(StoreCall::Increment(increment.clone()));
        self.inner.increment(increment)
    }

    fn flush(&self) -> StoreResult<()> {
        self.record(StoreCall::Flush);
        if self.fail_flush.load(Ordering::SeqCst) {
            return Err(Self::injected("flush"));
        }
        self.inner.flush()
    }

    fn close(&self) -> StoreResult<()> {
        self.record(StoreCall::Close);
        self.inner.close()
    }
}

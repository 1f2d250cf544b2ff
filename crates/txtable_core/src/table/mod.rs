//! The transaction-aware table wrapper.

mod commit;
mod rewrite;

use crate::config::TableConfig;
use crate::error::{CoreError, CoreResult};
use crate::log::{PendingLog, PendingMutation};
use tracing::{debug, trace, warn};
use txtable_codec::{Transaction, TransactionCodec};
use txtable_store::{
    decode_counter, Append, CellStore, Delete, Get, Increment, Mutation, Put, RowMutations,
    RowResult, Scan,
};

/// Where a table is in its transaction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// No transaction is bound.
    Unbound,
    /// A transaction is bound and nothing is buffered.
    BoundEmpty,
    /// A transaction is bound with buffered writes.
    BoundDirty,
}

/// Makes a non-transactional [`CellStore`] table take part in snapshot
/// transactions.
///
/// While a [`Transaction`] is bound:
/// - reads see only versions up to its read pointer, minus its excluded set
/// - puts and deletes are stamped with its write pointer and buffered
///   locally, in order
/// - [`commit_tx`](Self::commit_tx) replays the buffer against the store
/// - [`rollback_tx`](Self::rollback_tx) applies compensating writes
///
/// A table runs one transaction at a time and is reused across many. All
/// transactional calls take `&mut self`.
///
/// # Example
///
/// ```rust
/// use txtable_codec::Transaction;
/// use txtable_core::TransactionAwareTable;
/// use txtable_store::{Get, InMemoryStore, Put, Version};
///
/// let mut table = TransactionAwareTable::new(InMemoryStore::new());
///
/// table.bind(Transaction::new(Version::new(0), Version::new(1), [])).unwrap();
/// let mut put = Put::new("row");
/// put.add("f", "c", "v1");
/// table.put(&put).unwrap();
/// table.commit_tx().unwrap();
/// table.post_tx_commit();
///
/// table.bind(Transaction::new(Version::new(1), Version::new(2), [])).unwrap();
/// let row = table.get(&Get::new("row")).unwrap();
/// assert_eq!(row.value(b"f", b"c"), Some(&b"v1"[..]));
/// ```
#[derive(Debug)]
pub struct TransactionAwareTable<S: CellStore> {
    store: S,
    config: TableConfig,
    tx: Option<Transaction>,
    log: PendingLog,
}

impl<S: CellStore> TransactionAwareTable<S> {
    /// Wraps a store with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, TableConfig::default())
    }

    /// Wraps a store.
    pub fn with_config(store: S, config: TableConfig) -> Self {
        Self {
            store,
            config,
            tx: None,
            log: PendingLog::new(),
        }
    }

    /// Returns the participant name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config
            .name
            .as_deref()
            .unwrap_or_else(|| self.store.name())
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Returns true if a transaction is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.tx.is_some()
    }

    /// Returns the bound transaction.
    #[must_use]
    pub fn transaction(&self) -> Option<&Transaction> {
        self.tx.as_ref()
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.log.write_count()
    }

    /// Returns the pending log.
    #[must_use]
    pub fn pending(&self) -> &PendingLog {
        &self.log
    }

    /// Returns the snapshot gets recorded for the bound transaction.
    ///
    /// Always empty unless [`TableConfig::record_reads`] is set.
    pub fn read_set(&self) -> impl Iterator<Item = &Get> {
        self.log.reads()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> TableState {
        match (&self.tx, self.log.write_count()) {
            (None, _) => TableState::Unbound,
            (Some(_), 0) => TableState::BoundEmpty,
            (Some(_), _) => TableState::BoundDirty,
        }
    }

    /// Binds a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyBound`] if another transaction has not
    /// been committed or rolled back yet, or [`CoreError::Codec`] if the
    /// transaction is malformed (an excluded version above the write
    /// pointer, or a write pointer equal to [`Version::LATEST`](txtable_store::Version::LATEST)).
    pub fn bind(&mut self, tx: Transaction) -> CoreResult<()> {
        if let Some(current) = &self.tx {
            return Err(CoreError::AlreadyBound {
                write_pointer: current.write_pointer(),
            });
        }
        tx.validate()?;
        debug!(
            table = %self.name(),
            write_pointer = tx.write_pointer().as_u64(),
            read_pointer = tx.read_pointer().as_u64(),
            excluded = tx.excluded().len(),
            "bound transaction"
        );
        self.log.clear();
        self.tx = Some(tx);
        Ok(())
    }

    fn bound(&self) -> CoreResult<&Transaction> {
        self.tx.as_ref().ok_or(CoreError::NotBound)
    }

    fn unbind(&mut self) {
        self.tx = None;
        self.log.clear();
    }

    fn record_read(&mut self, get: Get) {
        if self.config.record_reads {
            self.log.push(PendingMutation::Get(get));
        }
    }

    // ------------------------------------------------------------------
    // Snapshot reads
    // ------------------------------------------------------------------

    /// Reads a row as the bound transaction sees it.
    ///
    /// Buffered writes of the same transaction are not visible.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the store
    /// failure.
    pub fn get(&mut self, get: &Get) -> CoreResult<RowResult> {
        let get = rewrite::snapshot_get(self.bound()?, get)?;
        let result = self.store.get(&get)?;
        self.record_read(get);
        Ok(result)
    }

    /// Reads several rows, returning results in request order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the store
    /// failure.
    pub fn get_many(&mut self, gets: &[Get]) -> CoreResult<Vec<RowResult>> {
        let tx = self.bound()?;
        let gets = gets
            .iter()
            .map(|get| rewrite::snapshot_get(tx, get))
            .collect::<CoreResult<Vec<_>>>()?;
        let results = self.store.get_many(&gets)?;
        for get in gets {
            self.record_read(get);
        }
        Ok(results)
    }

    /// Returns true if the snapshot read would return any cell.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the store
    /// failure.
    pub fn exists(&mut self, get: &Get) -> CoreResult<bool> {
        let get = rewrite::snapshot_get(self.bound()?, get)?;
        let found = self.store.exists(&get)?;
        self.record_read(get);
        Ok(found)
    }

    /// Scans a row range as the bound transaction sees it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the store
    /// failure.
    pub fn scan(&mut self, scan: &Scan) -> CoreResult<Vec<RowResult>> {
        let scan = rewrite::snapshot_scan(self.bound()?, scan)?;
        Ok(self.store.scan(&scan)?)
    }

    /// Scans every row, returning only one family.
    ///
    /// # Errors
    ///
    /// See [`scan`](Self::scan).
    pub fn scan_family(&mut self, family: impl Into<Vec<u8>>) -> CoreResult<Vec<RowResult>> {
        self.scan(&Scan::new().add_family(family))
    }

    /// Scans every row, returning only one column.
    ///
    /// # Errors
    ///
    /// See [`scan`](Self::scan).
    pub fn scan_column(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
    ) -> CoreResult<Vec<RowResult>> {
        self.scan(&Scan::new().add_column(family, qualifier))
    }

    // ------------------------------------------------------------------
    // Buffered writes
    // ------------------------------------------------------------------

    fn prepare_put(&self, put: &Put) -> CoreResult<PendingMutation> {
        let stamped = rewrite::stamp_put(self.bound()?, put)?;
        Ok(PendingMutation::Put(stamped))
    }

    fn prepare_delete(&self, delete: &Delete) -> CoreResult<PendingMutation> {
        let tx = self.bound()?;
        let pre_image_get =
            rewrite::pre_image_get(tx, &delete.row, self.config.pre_image_max_versions)?;
        let read = self.store.get(&pre_image_get)?;
        let (pre_image, undo_image) = rewrite::split_pre_image(tx, read);
        let delete = rewrite::stamp_delete(tx, delete)?;
        Ok(PendingMutation::Delete {
            delete,
            pre_image,
            undo_image,
        })
    }

    fn buffer(&mut self, entries: Vec<PendingMutation>) {
        for entry in entries {
            trace!(
                table = %self.name(),
                row = ?entry.row(),
                kind = entry.kind(),
                "buffered mutation"
            );
            self.log.push(entry);
        }
    }

    /// Buffers a put stamped with the write pointer.
    ///
    /// The store is not contacted until commit.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or
    /// [`CoreError::InvalidMutation`] if the put has no cells.
    pub fn put(&mut self, put: &Put) -> CoreResult<()> {
        let entry = self.prepare_put(put)?;
        self.buffer(vec![entry]);
        Ok(())
    }

    /// Buffers several puts. Nothing is buffered if any of them is rejected.
    ///
    /// # Errors
    ///
    /// See [`put`](Self::put).
    pub fn put_many(&mut self, puts: &[Put]) -> CoreResult<()> {
        let entries = puts
            .iter()
            .map(|put| self.prepare_put(put))
            .collect::<CoreResult<Vec<_>>>()?;
        self.buffer(entries);
        Ok(())
    }

    /// Captures the row's current state, then buffers a delete at the
    /// write pointer.
    ///
    /// Exact-version scopes cannot be stamped with the write pointer, so
    /// they are widened to whole-column deletes: every version of that
    /// column up to the write pointer is removed, not only the one named.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction, or the store
    /// failure from reading the pre-image.
    pub fn delete(&mut self, delete: &Delete) -> CoreResult<()> {
        let entry = self.prepare_delete(delete)?;
        self.buffer(vec![entry]);
        Ok(())
    }

    /// Buffers several deletes. Nothing is buffered if any pre-image read
    /// fails.
    ///
    /// # Errors
    ///
    /// See [`delete`](Self::delete).
    pub fn delete_many(&mut self, deletes: &[Delete]) -> CoreResult<()> {
        let entries = deletes
            .iter()
            .map(|delete| self.prepare_delete(delete))
            .collect::<CoreResult<Vec<_>>>()?;
        self.buffer(entries);
        Ok(())
    }

    /// Buffers each put and delete of a row, in order.
    ///
    /// # Errors
    ///
    /// See [`put`](Self::put) and [`delete`](Self::delete).
    pub fn mutate_row(&mut self, mutations: &RowMutations) -> CoreResult<()> {
        let entries = mutations
            .mutations()
            .iter()
            .map(|mutation| match mutation {
                Mutation::Put(put) => self.prepare_put(put),
                Mutation::Delete(delete) => self.prepare_delete(delete),
            })
            .collect::<CoreResult<Vec<_>>>()?;
        self.buffer(entries);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Non-transactional operations
    // ------------------------------------------------------------------

    /// Returns whether non-transactional operations are allowed.
    #[must_use]
    pub fn allow_non_transactional(&self) -> bool {
        self.config.allow_non_transactional
    }

    /// Allows or forbids non-transactional operations.
    pub fn set_allow_non_transactional(&mut self, allow: bool) {
        self.config.allow_non_transactional = allow;
    }

    fn bypass(&self, operation: &'static str) -> CoreResult<&S> {
        if self.config.allow_non_transactional {
            Ok(&self.store)
        } else {
            Err(CoreError::Unsupported { operation })
        }
    }

    /// Passes a check-and-put straight to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] unless non-transactional
    /// operations are allowed, or the store failure.
    pub fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> CoreResult<bool> {
        Ok(self
            .bypass("check_and_put")?
            .check_and_put(row, family, qualifier, expected, put)?)
    }

    /// Passes a check-and-delete straight to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] unless non-transactional
    /// operations are allowed, or the store failure.
    pub fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> CoreResult<bool> {
        Ok(self
            .bypass("check_and_delete")?
            .check_and_delete(row, family, qualifier, expected, delete)?)
    }

    /// Passes an append straight to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] unless non-transactional
    /// operations are allowed, or the store failure.
    pub fn append(&self, append: &Append) -> CoreResult<RowResult> {
        Ok(self.bypass("append")?.append(append)?)
    }

    /// Passes an increment straight to the store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] unless non-transactional
    /// operations are allowed, or the store failure.
    pub fn increment(&self, increment: &Increment) -> CoreResult<RowResult> {
        Ok(self.bypass("increment")?.increment(increment)?)
    }

    /// Increments one counter column and returns its new value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unsupported`] unless non-transactional
    /// operations are allowed, or the store failure.
    pub fn increment_column_value(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        amount: i64,
    ) -> CoreResult<i64> {
        let store = self.bypass("increment_column_value")?;
        let mut increment = Increment::new(row);
        increment.add_column(family, qualifier, amount);
        let result = store.increment(&increment)?;
        let value = result.value(family, qualifier).ok_or_else(|| {
            CoreError::invalid_mutation("increment returned no value for the column")
        })?;
        Ok(decode_counter(value)?)
    }

    // ------------------------------------------------------------------
    // Change reporting
    // ------------------------------------------------------------------

    /// Returns the encoded bound transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction.
    pub fn change_descriptor(&self) -> CoreResult<Vec<u8>> {
        Ok(TransactionCodec::encode(self.bound()?)?)
    }

    /// Returns the change set reported to the coordinator: a single
    /// descriptor for the bound transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotBound`] without a transaction.
    pub fn tx_changes(&self) -> CoreResult<Vec<Vec<u8>>> {
        Ok(vec![self.change_descriptor()?])
    }

    /// Returns the distinct rows touched by buffered writes, in the order
    /// they were first written.
    #[must_use]
    pub fn changed_rows(&self) -> Vec<Vec<u8>> {
        self.log.changed_rows()
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Flushes and closes the store.
    ///
    /// # Errors
    ///
    /// Returns the store failure.
    pub fn close(self) -> CoreResult<()> {
        if let Some(tx) = &self.tx {
            warn!(
                table = %self.name(),
                write_pointer = tx.write_pointer().as_u64(),
                pending = self.log.write_count(),
                "closing table with a bound transaction"
            );
        }
        self.store.flush()?;
        self.store.close()?;
        Ok(())
    }

    /// Returns the store without closing it. Buffered writes are dropped.
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txtable_codec::{CodecError, TX_OPERATION_ATTRIBUTE_KEY};
    use txtable_store::{
        encode_counter, DeleteScope, InMemoryStore, OperationWithAttributes, Version,
    };

    fn tx(rp: u64, wp: u64, excluded: &[u64]) -> Transaction {
        Transaction::new(
            Version::new(rp),
            Version::new(wp),
            excluded.iter().copied().map(Version::new),
        )
    }

    fn put_at(row: &str, ts: u64, value: &str) -> Put {
        let mut put = Put::with_timestamp(row, Version::new(ts));
        put.add("f", "c", value);
        put
    }

    fn table() -> TransactionAwareTable<InMemoryStore> {
        let store = InMemoryStore::new();
        store.put(&put_at("a", 1, "a1")).unwrap();
        store.put(&put_at("b", 1, "b1")).unwrap();
        store.put(&put_at("b", 3, "b3")).unwrap();
        store.put(&put_at("b", 5, "b5")).unwrap();
        TransactionAwareTable::new(store)
    }

    #[test]
    fn new_table_is_unbound() {
        let table = table();
        assert_eq!(table.state(), TableState::Unbound);
        assert!(!table.is_bound());
        assert!(table.transaction().is_none());
        assert_eq!(table.name(), "memory");
    }

    #[test]
    fn operations_fail_when_unbound() {
        let mut table = table();
        assert!(matches!(table.get(&Get::new("a")), Err(CoreError::NotBound)));
        assert!(matches!(table.scan(&Scan::new()), Err(CoreError::NotBound)));
        assert!(matches!(table.put(&put_at("a", 1, "x")), Err(CoreError::NotBound)));
        assert!(matches!(table.delete(&Delete::new("a")), Err(CoreError::NotBound)));
        assert!(matches!(table.change_descriptor(), Err(CoreError::NotBound)));
        assert_eq!(table.pending_count(), 0);
        assert_eq!(table.state(), TableState::Unbound);
    }

    #[test]
    fn bind_twice_fails() {
        let mut table = table();
        table.bind(tx(1, 2, &[])).unwrap();
        let err = table.bind(tx(2, 3, &[])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::AlreadyBound { write_pointer } if write_pointer == Version::new(2)
        ));
        assert_eq!(table.transaction().unwrap().write_pointer(), Version::new(2));
    }

    #[test]
    fn bind_rejects_latest_write_pointer() {
        let mut table = table();
        let err = table
            .bind(Transaction::new(Version::new(0), Version::LATEST, []))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Codec(CodecError::InvalidTransaction { .. })
        ));
        assert_eq!(table.state(), TableState::Unbound);
        assert!(table.put(&put_at("a", 1, "x")).is_err());
        assert_eq!(table.pending_count(), 0);
    }

    #[test]
    fn bind_rejects_exclusion_above_write_pointer() {
        let mut table = table();
        let err = table.bind(tx(3, 4, &[9])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Codec(CodecError::InvalidTransaction { .. })
        ));
        assert_eq!(table.state(), TableState::Unbound);
    }

    #[test]
    fn reads_honour_read_pointer_and_exclusions() {
        let mut table = table();
        table.bind(tx(4, 6, &[3])).unwrap();
        let row = table.get(&Get::new("b")).unwrap();
        assert_eq!(row.value(b"f", b"c"), Some(&b"b1"[..]));
    }

    #[test]
    fn scan_is_snapshot_filtered() {
        let mut table = table();
        table.bind(tx(0, 6, &[])).unwrap();
        assert!(table.scan(&Scan::new()).unwrap().is_empty());
        table.rollback_tx().unwrap();

        table.bind(tx(5, 6, &[])).unwrap();
        let rows = table.scan_column("f", "c").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value(b"f", b"c"), Some(&b"b5"[..]));
        assert_eq!(table.scan_family("g").unwrap().len(), 0);
    }

    #[test]
    fn get_many_and_exists() {
        let mut table = table();
        table.bind(tx(5, 6, &[])).unwrap();
        let rows = table
            .get_many(&[Get::new("b"), Get::new("missing"), Get::new("a")])
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2].row(), b"a");
        assert!(table.exists(&Get::new("a")).unwrap());
        assert!(!table.exists(&Get::new("missing")).unwrap());
    }

    #[test]
    fn put_is_buffered_and_stamped() {
        let mut table = table();
        table.bind(tx(5, 7, &[])).unwrap();
        table.put(&put_at("c", 99, "c7")).unwrap();

        assert_eq!(table.state(), TableState::BoundDirty);
        assert_eq!(table.pending_count(), 1);
        assert!(table.store().raw_row(b"c").is_empty());

        // no read-your-own-writes
        assert!(table.get(&Get::new("c")).unwrap().is_empty());

        match table.pending().iter().next() {
            Some(PendingMutation::Put(put)) => {
                assert_eq!(put.cells[0].timestamp, Version::new(7));
                assert!(put.attribute(TX_OPERATION_ATTRIBUTE_KEY).is_some());
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn empty_put_is_rejected() {
        let mut table = table();
        table.bind(tx(5, 7, &[])).unwrap();
        assert!(matches!(
            table.put(&Put::new("c")),
            Err(CoreError::InvalidMutation { .. })
        ));
        assert_eq!(table.state(), TableState::BoundEmpty);
    }

    #[test]
    fn put_many_is_all_or_nothing() {
        let mut table = table();
        table.bind(tx(5, 7, &[])).unwrap();
        let result = table.put_many(&[put_at("c", 1, "x"), Put::new("d")]);
        assert!(result.is_err());
        assert_eq!(table.pending_count(), 0);

        table.put_many(&[put_at("c", 1, "x"), put_at("d", 1, "y")]).unwrap();
        assert_eq!(table.pending_count(), 2);
    }

    #[test]
    fn delete_captures_snapshot_and_undo_images() {
        let mut table = table();
        table.bind(tx(4, 6, &[3])).unwrap();
        let mut delete = Delete::new("b");
        delete.delete_version("f", "c", Version::new(1));
        table.delete(&delete).unwrap();

        match table.pending().iter().next() {
            Some(PendingMutation::Delete {
                delete,
                pre_image,
                undo_image,
            }) => {
                assert_eq!(delete.timestamp, Version::new(6));
                assert_eq!(
                    delete.scopes,
                    vec![DeleteScope::Column(b"f".to_vec(), b"c".to_vec())]
                );
                let versions: Vec<_> =
                    pre_image.cells().iter().map(|c| c.timestamp.as_u64()).collect();
                assert_eq!(versions, vec![1]);
                let removed: Vec<_> =
                    undo_image.cells().iter().map(|c| c.timestamp.as_u64()).collect();
                assert_eq!(removed, vec![5, 3, 1]);
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn pre_image_version_limit() {
        let mut table = TransactionAwareTable::with_config(
            table().into_inner(),
            TableConfig::new().pre_image_max_versions(1),
        );
        table.bind(tx(5, 6, &[])).unwrap();
        table.delete(&Delete::new("b")).unwrap();
        match table.pending().iter().next() {
            Some(PendingMutation::Delete { pre_image, .. }) => assert_eq!(pre_image.len(), 1),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn mutate_row_buffers_in_order() {
        let mut table = table();
        table.bind(tx(5, 6, &[])).unwrap();
        let mut mutations = RowMutations::new("a");
        mutations.add(Delete::new("a")).unwrap();
        mutations.add(put_at("a", 1, "new")).unwrap();
        table.mutate_row(&mutations).unwrap();

        let kinds: Vec<_> = table.pending().iter().map(PendingMutation::kind).collect();
        assert_eq!(kinds, vec!["delete", "put"]);
        assert_eq!(table.changed_rows(), vec![b"a".to_vec()]);
    }

    #[test]
    fn record_reads_keeps_read_set() {
        let mut table = TransactionAwareTable::with_config(
            InMemoryStore::new(),
            TableConfig::new().record_reads(true),
        );
        table.bind(tx(5, 6, &[])).unwrap();
        table.get(&Get::new("a")).unwrap();
        table.get_many(&[Get::new("b")]).unwrap();

        assert_eq!(table.read_set().count(), 2);
        assert_eq!(table.pending_count(), 0);
        assert_eq!(table.state(), TableState::BoundEmpty);
        table.commit_tx().unwrap();
        table.post_tx_commit();
        assert_eq!(table.read_set().count(), 0);
    }

    #[test]
    fn bypass_operations_need_flag() {
        let mut table = table();
        let mut inc = Increment::new("n");
        inc.add_column("f", "count", 1);
        assert!(matches!(
            table.increment(&inc),
            Err(CoreError::Unsupported { operation: "increment" })
        ));
        assert!(matches!(
            table.append(&Append::new("a")),
            Err(CoreError::Unsupported { .. })
        ));
        assert!(matches!(
            table.check_and_put(b"a", b"f", b"c", None, &put_at("a", 1, "x")),
            Err(CoreError::Unsupported { .. })
        ));
        assert!(matches!(
            table.check_and_delete(b"a", b"f", b"c", None, &Delete::new("a")),
            Err(CoreError::Unsupported { .. })
        ));

        table.set_allow_non_transactional(true);
        assert!(table.allow_non_transactional());
        assert_eq!(table.increment_column_value(b"n", b"f", b"count", 4).unwrap(), 4);
        let result = table.increment(&inc).unwrap();
        assert_eq!(result.value(b"f", b"count"), Some(&encode_counter(5)[..]));

        let mut append = Append::new("a");
        append.add("f", "c", "+");
        assert_eq!(
            table.append(&append).unwrap().value(b"f", b"c"),
            Some(&b"a1+"[..])
        );
        assert!(table
            .check_and_put(b"z", b"f", b"c", None, &put_at("z", 1, "x"))
            .unwrap());
        assert!(table
            .check_and_delete(b"z", b"f", b"c", Some(b"x"), &Delete::new("z"))
            .unwrap());
    }

    #[test]
    fn descriptor_matches_bound_transaction() {
        let mut table = table();
        let t = tx(4, 6, &[3]);
        table.bind(t.clone()).unwrap();
        let bytes = table.change_descriptor().unwrap();
        assert_eq!(TransactionCodec::decode(&bytes).unwrap(), t);
        assert_eq!(table.tx_changes().unwrap(), vec![bytes]);
    }

    #[test]
    fn close_releases_store() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let table = TransactionAwareTable::new(store.clone());
        table.close().unwrap();
        assert!(store.is_closed());
    }
}

//! Store trait definition.

use crate::error::StoreResult;
use crate::ops::{Append, Delete, Get, Increment, Put, Scan};
use crate::types::RowResult;
use std::sync::Arc;

/// A versioned, sorted cell store.
///
/// Stores are **not transactional**. Each call is applied per cell, with no
/// coordination across rows. Transactional behaviour is layered on top by
/// `txtable_core`.
///
/// # Invariants
///
/// - Reads honour the request's [`CellFilter`](crate::CellFilter): column
///   selection, version ceiling, excluded versions and versions per column
/// - A put or delete at a fixed version is idempotent
/// - Mutations may sit in a client-side write buffer until [`flush`](Self::flush)
/// - `check_and_*`, `append` and `increment` are applied atomically and
///   bypass the write buffer
/// - Implementations must be `Send + Sync`; a handle is usually shared
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and embedding
pub trait CellStore: Send + Sync {
    /// Returns the table name.
    fn name(&self) -> &str;

    /// Reads one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the read.
    fn get(&self, get: &Get) -> StoreResult<RowResult>;

    /// Reads several rows, returning results in request order.
    ///
    /// # Errors
    ///
    /// Returns the first read failure.
    fn get_many(&self, gets: &[Get]) -> StoreResult<Vec<RowResult>> {
        gets.iter().map(|get| self.get(get)).collect()
    }

    /// Returns true if the get would return at least one cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the read.
    fn exists(&self, get: &Get) -> StoreResult<bool> {
        Ok(!self.get(get)?.is_empty())
    }

    /// Reads a row range in row order, skipping rows with no matching cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the scan.
    fn scan(&self, scan: &Scan) -> StoreResult<Vec<RowResult>>;

    /// Writes cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the put is malformed or cannot be applied.
    fn put(&self, put: &Put) -> StoreResult<()>;

    /// Deletes cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be applied.
    fn delete(&self, delete: &Delete) -> StoreResult<()>;

    /// Applies `put` only if the newest value of `family:qualifier` in `row`
    /// equals `expected` (`None` means the column must be absent).
    ///
    /// Returns whether the put was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if `put` targets a different row or cannot be applied.
    fn check_and_put(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        put: &Put,
    ) -> StoreResult<bool>;

    /// Applies `delete` only if the newest value of `family:qualifier` in
    /// `row` equals `expected` (`None` means the column must be absent).
    ///
    /// Returns whether the delete was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if `delete` targets a different row or cannot be applied.
    fn check_and_delete(
        &self,
        row: &[u8],
        family: &[u8],
        qualifier: &[u8],
        expected: Option<&[u8]>,
        delete: &Delete,
    ) -> StoreResult<bool>;

    /// Appends to column values, returning the new cells.
    ///
    /// # Errors
    ///
    /// Returns an error if the append cannot be applied.
    fn append(&self, append: &Append) -> StoreResult<RowResult>;

    /// Adds to counter columns, returning the new cells.
    ///
    /// # Errors
    ///
    /// Returns an error if a current value is not a counter or the
    /// increment overflows.
    fn increment(&self, increment: &Increment) -> StoreResult<RowResult>;

    /// Applies every buffered mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if a buffered mutation cannot be applied.
    fn flush(&self) -> StoreResult<()>;

    /// Flushes and releases the connection. Later calls fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&self) -> StoreResult<()>;
}

// Shared handles forward to the underlying store
macro_rules! forward_cell_store {
    ($($ty:ty),*) => {$(
        impl<S: CellStore + ?Sized> CellStore for $ty {
            fn name(&self) -> &str {
                (**self).name()
            }

            fn get(&self, get: &Get) -> StoreResult<RowResult> {
                (**self).get(get)
            }

            fn get_many(&self, gets: &[Get]) -> StoreResult<Vec<RowResult>> {
                (**self).get_many(gets)
            }

            fn exists(&self, get: &Get) -> StoreResult<bool> {
                (**self).exists(get)
            }

            fn scan(&self, scan: &Scan) -> StoreResult<Vec<RowResult>> {
                (**self).scan(scan)
            }

            fn put(&self, put: &Put) -> StoreResult<()> {
                (**self).put(put)
            }

            fn delete(&self, delete: &Delete) -> StoreResult<()> {
                (**self).delete(delete)
            }

            fn check_and_put(
                &self,
                row: &[u8],
                family: &[u8],
                qualifier: &[u8],
                expected: Option<&[u8]>,
                put: &Put,
            ) -> StoreResult<bool> {
                (**self).check_and_put(row, family, qualifier, expected, put)
            }

            fn check_and_delete(
                &self,
                row: &[u8],
                family: &[u8],
                qualifier: &[u8],
                expected: Option<&[u8]>,
                delete: &Delete,
            ) -> StoreResult<bool> {
                (**self).check_and_delete(row, family, qualifier, expected, delete)
            }

            fn append(&self, append: &Append) -> StoreResult<RowResult> {
                (**self).append(append)
            }

            fn increment(&self, increment: &Increment) -> StoreResult<RowResult> {
                (**self).increment(increment)
            }

            fn flush(&self) -> StoreResult<()> {
                (**self).flush()
            }

            fn close(&self) -> StoreResult<()> {
                (**self).close()
            }
        }
    )*};
}

forward_cell_store!(Arc<S>, &S);

//! The pending mutation log.

use txtable_store::{Delete, Get, Put, RowResult};

/// An entry in the pending log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    /// A snapshot read, kept only when read recording is on.
    Get(Get),
    /// A put stamped with the write pointer.
    Put(Put),
    /// A delete at the write pointer, with the row as it looked when the
    /// delete was buffered.
    Delete {
        /// The stamped delete.
        delete: Delete,
        /// The row as the transaction's snapshot saw it at buffer time.
        pre_image: RowResult,
        /// Every cell the delete can remove, visible or not. Rollback
        /// writes these back.
        undo_image: RowResult,
    },
}

impl PendingMutation {
    /// Returns the row key.
    #[must_use]
    pub fn row(&self) -> &[u8] {
        match self {
            Self::Get(get) => &get.row,
            Self::Put(put) => &put.row,
            Self::Delete { delete, .. } => &delete.row,
        }
    }

    /// Returns a short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Get(_) => "get",
            Self::Put(_) => "put",
            Self::Delete { .. } => "delete",
        }
    }

    /// Returns true for puts and deletes.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get(_))
    }
}

/// Buffered mutations of the bound transaction, in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct PendingLog {
    entries: Vec<PendingMutation>,
}

impl PendingLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: PendingMutation) {
        self.entries.push(entry);
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, PendingMutation> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of puts and deletes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_write()).count()
    }

    /// Returns the distinct rows touched by writes, in first-touch order.
    #[must_use]
    pub fn changed_rows(&self) -> Vec<Vec<u8>> {
        let mut rows: Vec<Vec<u8>> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.is_write()) {
            if !rows.iter().any(|r| r.as_slice() == entry.row()) {
                rows.push(entry.row().to_vec());
            }
        }
        rows
    }

    /// Returns the recorded reads.
    pub fn reads(&self) -> impl Iterator<Item = &Get> {
        self.entries.iter().filter_map(|e| match e {
            PendingMutation::Get(get) => Some(get),
            _ => None,
        })
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a PendingLog {
    type Item = &'a PendingMutation;
    type IntoIter = std::slice::Iter<'a, PendingMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delete(row: &str) -> PendingMutation {
        PendingMutation::Delete {
            delete: Delete::new(row),
            pre_image: RowResult::empty(row),
            undo_image: RowResult::empty(row),
        }
    }

    #[test]
    fn keeps_insertion_order() {
        let mut log = PendingLog::new();
        log.push(PendingMutation::Put(Put::new("b")));
        log.push(delete("a"));
        log.push(PendingMutation::Put(Put::new("b")));

        let rows: Vec<_> = log.iter().map(|e| e.row().to_vec()).collect();
        assert_eq!(rows, vec![b"b".to_vec(), b"a".to_vec(), b"b".to_vec()]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn changed_rows_are_distinct_writes() {
        let mut log = PendingLog::new();
        log.push(PendingMutation::Get(Get::new("z")));
        log.push(PendingMutation::Put(Put::new("b")));
        log.push(delete("a"));
        log.push(PendingMutation::Put(Put::new("b")));

        assert_eq!(log.changed_rows(), vec![b"b".to_vec(), b"a".to_vec()]);
        assert_eq!(log.write_count(), 3);
        assert_eq!(log.reads().count(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut log = PendingLog::new();
        log.push(delete("a"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.write_count(), 0);
    }
}

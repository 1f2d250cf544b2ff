//! The transaction descriptor.

use std::collections::BTreeSet;
use crate::error::{CodecError, CodecResult};
use std::fmt;
use txtable_store::Version;

/// A snapshot transaction handed out by an external coordinator.
///
/// - The **write pointer** stamps every cell the transaction writes and
///   doubles as its id.
/// - The **read pointer** is the highest version its reads may see.
/// - The **excluded set** lists versions (in-progress or invalidated
///   transactions) that stay hidden even at or below the read pointer.
///
/// Transactions are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    read_pointer: Version,
    write_pointer: Version,
    excluded: BTreeSet<Version>,
}

impl Transaction {
    /// Creates a transaction.
    pub fn new(
        read_pointer: Version,
        write_pointer: Version,
        excluded: impl IntoIterator<Item = Version>,
    ) -> Self {
        Self {
            read_pointer,
            write_pointer,
            excluded: excluded.into_iter().collect(),
        }
    }

    /// Returns the transaction id, which is its write pointer.
    #[must_use]
    pub fn id(&self) -> Version {
        self.write_pointer
    }

    /// Returns the highest version visible to reads.
    #[must_use]
    pub fn read_pointer(&self) -> Version {
        self.read_pointer
    }

    /// Returns the version stamped on every write.
    #[must_use]
    pub fn write_pointer(&self) -> Version {
        self.write_pointer
    }

    /// Returns the versions hidden from reads, ascending.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<Version> {
        &self.excluded
    }

    /// Returns true if `version` is in the excluded set.
    #[must_use]
    pub fn is_excluded(&self, version: Version) -> bool {
        self.excluded.contains(&version)
    }

    /// Returns true if a cell at `version` is visible to this transaction.
    #[must_use]
    pub fn is_visible(&self, version: Version) -> bool {
        version <= self.read_pointer && !self.is_excluded(version)
    }

    /// Checks that the transaction can be encoded and bound.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidTransaction`] if the write pointer is
    /// [`Version::LATEST`], which the store would replace with its own
    /// clock, or if an excluded version is above the write pointer.
    pub fn validate(&self) -> CodecResult<()> {
        if self.write_pointer == Version::LATEST {
            return Err(CodecError::invalid_transaction(
                "write pointer cannot be the store's LATEST sentinel",
            ));
        }
        if let Some(bad) = self.excluded.range(self.write_pointer.next()..).next() {
            return Err(CodecError::invalid_transaction(format!(
                "excluded version {} is above write pointer {}",
                bad.as_u64(),
                self.write_pointer.as_u64()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx(wp={}, rp={}, excluded={})",
            self.write_pointer.as_u64(),
            self.read_pointer.as_u64(),
            self.excluded.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility() {
        let tx = Transaction::new(Version::new(10), Version::new(12), [Version::new(7)]);
        assert!(tx.is_visible(Version::new(10)));
        assert!(tx.is_visible(Version::new(1)));
        assert!(!tx.is_visible(Version::new(11)));
        assert!(!tx.is_visible(Version::new(7)));
        assert!(tx.is_excluded(Version::new(7)));
    }

    #[test]
    fn id_is_write_pointer() {
        let tx = Transaction::new(Version::new(3), Version::new(5), []);
        assert_eq!(tx.id(), Version::new(5));
        assert_eq!(tx.read_pointer(), Version::new(3));
        assert!(tx.excluded().is_empty());
    }

    #[test]
    fn validate_accepts_exclusions_up_to_write_pointer() {
        let tx = Transaction::new(
            Version::new(3),
            Version::new(5),
            [Version::new(4), Version::new(5)],
        );
        assert!(tx.validate().is_ok());
    }

    #[test]
    fn validate_rejects_exclusion_above_write_pointer() {
        let tx = Transaction::new(Version::new(3), Version::new(4), [Version::new(9)]);
        assert!(matches!(
            tx.validate(),
            Err(CodecError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn validate_rejects_latest_write_pointer() {
        let tx = Transaction::new(Version::new(0), Version::LATEST, []);
        assert!(matches!(
            tx.validate(),
            Err(CodecError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn display() {
        let tx = Transaction::new(Version::new(3), Version::new(5), [Version::new(4)]);
        assert_eq!(tx.to_string(), "tx(wp=5, rp=3, excluded=1)");
    }
}

//! Rewrites caller operations into their transactional form.

use crate::error::{CoreError, CoreResult};
use txtable_codec::{Transaction, TransactionCodec};
use txtable_store::{CellFilter, Delete, DeleteScope, Get, Put, RowResult, Scan, Version};

/// Narrows a read filter to what `tx` may see.
fn restrict(tx: &Transaction, filter: &mut CellFilter) {
    let ceiling = tx.read_pointer();
    filter.max_version = Some(filter.max_version.map_or(ceiling, |v| v.min(ceiling)));
    filter.excluded.extend(tx.excluded().iter().copied());
}

/// Returns `get` limited to the transaction's snapshot.
pub(crate) fn snapshot_get(tx: &Transaction, get: &Get) -> CoreResult<Get> {
    let mut get = get.clone();
    restrict(tx, &mut get.filter);
    TransactionCodec::add_to_operation(&mut get, tx)?;
    Ok(get)
}

/// Returns `scan` limited to the transaction's snapshot.
pub(crate) fn snapshot_scan(tx: &Transaction, scan: &Scan) -> CoreResult<Scan> {
    let mut scan = scan.clone();
    restrict(tx, &mut scan.filter);
    TransactionCodec::add_to_operation(&mut scan, tx)?;
    Ok(scan)
}

/// Builds the read that captures a row before it is deleted.
///
/// The read covers every version below the write pointer, including
/// versions the snapshot cannot see, since the stamped delete removes
/// those too.
pub(crate) fn pre_image_get(tx: &Transaction, row: &[u8], max_versions: u32) -> CoreResult<Get> {
    let ceiling = Version::new(tx.write_pointer().as_u64().saturating_sub(1));
    let mut get = Get::new(row)
        .with_max_versions(max_versions)
        .with_max_version(ceiling);
    TransactionCodec::add_to_operation(&mut get, tx)?;
    Ok(get)
}

/// Splits a pre-image read into the snapshot view and the full undo image.
pub(crate) fn split_pre_image(tx: &Transaction, read: RowResult) -> (RowResult, RowResult) {
    let visible = read
        .cells()
        .iter()
        .filter(|cell| tx.is_visible(cell.timestamp))
        .cloned()
        .collect();
    (RowResult::new(read.row(), visible), read)
}

/// Returns a copy of `put` with every cell at the write pointer.
///
/// Attributes and durability carry over.
pub(crate) fn stamp_put(tx: &Transaction, put: &Put) -> CoreResult<Put> {
    if put.is_empty() {
        return Err(CoreError::invalid_mutation("put has no cells"));
    }
    let wp = tx.write_pointer();
    let mut stamped = put.clone();
    stamped.timestamp = wp;
    for cell in &mut stamped.cells {
        cell.timestamp = wp;
    }
    TransactionCodec::add_to_operation(&mut stamped, tx)?;
    Ok(stamped)
}

/// Returns a copy of `delete` bounded by the write pointer.
///
/// Exact-version scopes become whole-column scopes at the write pointer.
pub(crate) fn stamp_delete(tx: &Transaction, delete: &Delete) -> CoreResult<Delete> {
    let mut stamped = delete.clone();
    stamped.timestamp = tx.write_pointer();
    stamped.scopes = delete
        .scopes
        .iter()
        .map(|scope| match scope {
            DeleteScope::Version(family, qualifier, _) => {
                DeleteScope::Column(family.clone(), qualifier.clone())
            }
            other => other.clone(),
        })
        .collect();
    TransactionCodec::add_to_operation(&mut stamped, tx)?;
    Ok(stamped)
}

/// Undoes a buffered put: deletes exactly the versions it wrote.
pub(crate) fn compensating_delete(tx: &Transaction, put: &Put) -> CoreResult<Delete> {
    let mut delete = Delete::new(put.row.clone());
    for cell in &put.cells {
        delete.delete_version(cell.family.clone(), cell.qualifier.clone(), cell.timestamp);
    }
    delete.durability = put.durability;
    TransactionCodec::add_to_operation(&mut delete, tx)?;
    Ok(delete)
}

/// Undoes a buffered delete: writes the undo image back at its original
/// versions. Returns `None` when the row was empty.
pub(crate) fn compensating_put(tx: &Transaction, undo_image: &RowResult) -> CoreResult<Option<Put>> {
    if undo_image.is_empty() {
        return Ok(None);
    }
    let mut put = Put::new(undo_image.row());
    for cell in undo_image.cells() {
        put.add_at(
            cell.family.clone(),
            cell.qualifier.clone(),
            cell.timestamp,
            cell.value.clone(),
        );
    }
    TransactionCodec::add_to_operation(&mut put, tx)?;
    Ok(Some(put))
}

#[cfg(test)]
mod tests {
    use super::*;
    use txtable_codec::TX_OPERATION_ATTRIBUTE_KEY;
    use txtable_store::{Cell, Durability, OperationWithAttributes};

    fn tx() -> Transaction {
        Transaction::new(Version::new(10), Version::new(12), [Version::new(8)])
    }

    #[test]
    fn snapshot_get_caps_ceiling_and_adds_exclusions() {
        let get = snapshot_get(&tx(), &Get::new("r").with_excluded([Version::new(2)])).unwrap();
        assert_eq!(get.filter.max_version, Some(Version::new(10)));
        assert!(get.filter.excluded.contains(&Version::new(8)));
        assert!(get.filter.excluded.contains(&Version::new(2)));
        assert!(get.attribute(TX_OPERATION_ATTRIBUTE_KEY).is_some());

        let lower = snapshot_get(&tx(), &Get::new("r").with_max_version(Version::new(4))).unwrap();
        assert_eq!(lower.filter.max_version, Some(Version::new(4)));
    }

    #[test]
    fn snapshot_scan_caps_ceiling() {
        let scan = snapshot_scan(&tx(), &Scan::range("a", "b")).unwrap();
        assert_eq!(scan.filter.max_version, Some(Version::new(10)));
        assert_eq!(scan.stop_row.as_deref(), Some(&b"b"[..]));
    }

    #[test]
    fn stamp_put_overrides_timestamps_and_keeps_metadata() {
        let mut put = Put::with_timestamp("r", Version::new(99));
        put.add("f", "a", "1").add_at("f", "b", Version::new(3), "2");
        put.set_durability(Durability::SkipWal);
        put.set_attribute("caller", b"x".to_vec());

        let stamped = stamp_put(&tx(), &put).unwrap();
        assert!(stamped.cells.iter().all(|c| c.timestamp == Version::new(12)));
        assert_eq!(stamped.durability, Durability::SkipWal);
        assert_eq!(stamped.attribute("caller"), Some(&b"x"[..]));
        assert!(stamped.attribute(TX_OPERATION_ATTRIBUTE_KEY).is_some());
    }

    #[test]
    fn stamp_put_rejects_empty() {
        assert!(matches!(
            stamp_put(&tx(), &Put::new("r")),
            Err(CoreError::InvalidMutation { .. })
        ));
    }

    #[test]
    fn stamp_delete_widens_version_scopes() {
        let mut delete = Delete::new("r");
        delete.delete_version("f", "a", Version::new(3)).delete_family("g");

        let stamped = stamp_delete(&tx(), &delete).unwrap();
        assert_eq!(stamped.timestamp, Version::new(12));
        assert_eq!(
            stamped.scopes,
            vec![
                DeleteScope::Column(b"f".to_vec(), b"a".to_vec()),
                DeleteScope::Family(b"g".to_vec()),
            ]
        );
    }

    #[test]
    fn compensating_delete_targets_exact_versions() {
        let stamped = {
            let mut put = Put::new("r");
            put.add("f", "a", "1");
            stamp_put(&tx(), &put).unwrap()
        };
        let delete = compensating_delete(&tx(), &stamped).unwrap();
        assert_eq!(
            delete.scopes,
            vec![DeleteScope::Version(b"f".to_vec(), b"a".to_vec(), Version::new(12))]
        );
    }

    #[test]
    fn pre_image_get_reaches_below_write_pointer() {
        let get = pre_image_get(&tx(), b"r", 4).unwrap();
        assert_eq!(get.filter.max_version, Some(Version::new(11)));
        assert!(get.filter.excluded.is_empty());
        assert_eq!(get.filter.max_versions, 4);
    }

    #[test]
    fn split_pre_image_keeps_hidden_cells_for_undo() {
        let read = RowResult::new(
            "r",
            vec![
                Cell::new("f", "a", Version::new(11), "pending"),
                Cell::new("f", "a", Version::new(8), "excluded"),
                Cell::new("f", "a", Version::new(4), "visible"),
            ],
        );
        let (pre_image, undo_image) = split_pre_image(&tx(), read);
        assert_eq!(pre_image.len(), 1);
        assert_eq!(pre_image.cells()[0].value, b"visible");
        assert_eq!(undo_image.len(), 3);
    }

    #[test]
    fn compensating_put_restores_original_versions() {
        let pre_image = RowResult::new(
            "r",
            vec![
                Cell::new("f", "a", Version::new(5), "new"),
                Cell::new("f", "a", Version::new(2), "old"),
            ],
        );
        let put = compensating_put(&tx(), &pre_image).unwrap().unwrap();
        let versions: Vec<_> = put.cells.iter().map(|c| c.timestamp.as_u64()).collect();
        assert_eq!(versions, vec![5, 2]);

        assert!(compensating_put(&tx(), &RowResult::empty("r")).unwrap().is_none());
    }
}

//! Removing attachments, with or without their object

use crate::{
    records::{AttachmentRecord, AttachmentRepository, RecordError},
    store::{ObjectStore, StoreError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("deleting {bucket}/{key}: {source}")]
    Store {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("record {name}: {source}")]
    Records {
        name: String,
        #[source]
        source: RecordError,
    },
}

/// Delete the object of `record`, nothing is deleted when the record is marked to skip it.
/// Returns whether the store was asked to delete.
///
/// # Errors
///
/// Will return `Err` if the store refuses the deletion
pub async fn delete<S: ObjectStore>(
    store: &S,
    record: &AttachmentRecord,
) -> Result<bool, DeleteError> {
    if record.skip_remote_deletion {
        log::info!(
            "skip deleting {}/{}, record {} is marked",
            store.bucket(),
            record.object_key,
            record.name
        );
        return Ok(false);
    }

    store
        .delete(&record.object_key)
        .await
        .map_err(|source| DeleteError::Store {
            bucket: store.bucket().to_string(),
            key: record.object_key.clone(),
            source,
        })?;

    log::info!("deleted {}/{}", store.bucket(), record.object_key);

    Ok(true)
}

/// Delete the object then the record named `name`, the record stays if the object can't be
/// deleted
///
/// # Errors
///
/// Will return `Err` if the record does not exist or either deletion fails
pub async fn remove<S, R>(store: &S, records: &R, name: &str) -> Result<AttachmentRecord, DeleteError>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    let record = get(records, name)?;
    delete(store, &record).await?;
    records.delete(name).map_err(|source| records_error(name, source))
}

/// Drop the record named `name` and keep its object in the store
///
/// # Errors
///
/// Will return `Err` if the record does not exist or can't be updated
pub fn unlink<R>(records: &R, name: &str) -> Result<AttachmentRecord, DeleteError>
where
    R: AttachmentRepository + ?Sized,
{
    let mut record = get(records, name)?;
    record.skip_remote_deletion = true;
    records
        .update(&record)
        .map_err(|source| records_error(name, source))?;

    let record = records
        .delete(name)
        .map_err(|source| records_error(name, source))?;

    log::info!(
        "unlinked {}/{}, record {} removed",
        record.destination,
        record.object_key,
        record.name
    );

    Ok(record)
}

fn get<R>(records: &R, name: &str) -> Result<AttachmentRecord, DeleteError>
where
    R: AttachmentRepository + ?Sized,
{
    records
        .get(name)
        .map_err(|source| records_error(name, source))?
        .ok_or_else(|| records_error(name, RecordError::NotFound(name.to_string())))
}

fn records_error(name: &str, source: RecordError) -> DeleteError {
    DeleteError::Records {
        name: name.to_string(),
        source,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        records::SledRepository,
        store::{MemoryStore, memory::Operation},
    };

    fn setup() -> (MemoryStore, SledRepository, AttachmentRecord) {
        let store = MemoryStore::new("media");
        store.put_object("a.png", "png", "image/png");
        let records = SledRepository::temporary().unwrap();
        let record = AttachmentRecord::new("media", "a.png", "a.png");
        records.create(&record).unwrap();
        (store, records, record)
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, records, record) = setup();

        let removed = remove(&store, &records, &record.name).await.unwrap();

        assert_eq!(removed.name, record.name);
        assert!(store.object("a.png").is_none());
        assert!(records.get(&record.name).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skip_remote_deletion() {
        let (store, records, mut record) = setup();
        record.skip_remote_deletion = true;
        records.update(&record).unwrap();

        assert!(!delete(&store, &record).await.unwrap());
        remove(&store, &records, &record.name).await.unwrap();

        assert!(store.object("a.png").is_some());
        assert!(!store.calls().contains(&Operation::Delete));
        assert!(records.get(&record.name).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_keeps_record_when_store_fails() {
        let (store, records, record) = setup();
        store.fail(Operation::Delete, StoreError::Auth("denied".into()));

        let err = remove(&store, &records, &record.name).await.unwrap_err();

        assert!(matches!(err, DeleteError::Store { .. }), "{err}");
        assert!(records.get(&record.name).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unlink_keeps_object() {
        let (store, records, record) = setup();

        let unlinked = unlink(&records, &record.name).unwrap();

        assert!(unlinked.skip_remote_deletion);
        assert!(store.object("a.png").is_some());
        assert!(store.calls().is_empty());
        assert!(records.linked_keys("media").unwrap().is_empty());
    }

    #[test]
    fn test_unlink_missing() {
        let records = SledRepository::temporary().unwrap();
        let err = unlink(&records, "missing").unwrap_err();
        assert!(matches!(
            err,
            DeleteError::Records {
                source: RecordError::NotFound(_),
                ..
            }
        ));
    }
}

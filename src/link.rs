//! Adopting objects already in the store as attachment records

use crate::{
    destination::Destination,
    lock::{KeyGuard, LockRegistry},
    naming::file_name_from_key,
    records::{AttachmentRecord, AttachmentRepository, RecordError},
    store::{ObjectStore, StoreError},
};
use thiserror::Error;

/// Message of batch items skipped because the object is linked or being linked
pub const ALREADY_LINKED: &str = "already linked";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{destination}/{key} is already linked")]
    AlreadyLinked { destination: String, key: String },

    #[error("{destination}/{key} is being uploaded or linked")]
    Locked { destination: String, key: String },

    #[error("{destination}/{key}: {source}")]
    Store {
        destination: String,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("{destination}/{key}: {source}")]
    Records {
        destination: String,
        key: String,
        #[source]
        source: RecordError,
    },

    #[error("{destination}/{key}: {message}")]
    Url {
        destination: String,
        key: String,
        message: String,
    },
}

impl LinkError {
    /// Errors that would hit every other key of a batch too
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_fatal(),
            Self::Records {
                source: RecordError::Storage(_),
                ..
            } => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResultItem {
    pub object_key: String,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkResult {
    pub items: Vec<LinkResultItem>,
}

impl LinkResult {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.success).count()
    }
}

/// Creates records for objects of one destination
pub struct Linker<'a, S, R: ?Sized> {
    store: &'a S,
    records: &'a R,
    destination: &'a Destination,
    locks: &'a LockRegistry,
    group: Option<String>,
    owner: Option<String>,
}

impl<'a, S, R> Linker<'a, S, R>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    #[must_use]
    pub fn new(store: &'a S, records: &'a R, destination: &'a Destination) -> Self {
        Self {
            store,
            records,
            destination,
            locks: LockRegistry::global(),
            group: None,
            owner: None,
        }
    }

    #[must_use]
    pub const fn with_locks(mut self, locks: &'a LockRegistry) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Option<&str>) -> Self {
        self.group = group.filter(|g| !g.trim().is_empty()).map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: Option<&str>) -> Self {
        self.owner = owner.map(ToString::to_string);
        self
    }

    fn lock(&self, key: &str) -> Option<KeyGuard<'a>> {
        self.locks.try_lock(self.store.bucket(), key)
    }

    /// Create a record for `object_key`, which must exist in the store
    ///
    /// # Errors
    ///
    /// Will return `Err` if the key is locked or linked, the object can't be read or the record
    /// can't be created
    pub async fn link_existing(&self, object_key: &str) -> Result<AttachmentRecord, LinkError> {
        let Some(_guard) = self.lock(object_key) else {
            return Err(LinkError::Locked {
                destination: self.destination.name.clone(),
                key: object_key.to_string(),
            });
        };

        let existing = self
            .records
            .find(&self.destination.name, object_key)
            .map_err(|source| self.records_error(object_key, source))?;
        if existing.is_some() {
            return Err(LinkError::AlreadyLinked {
                destination: self.destination.name.clone(),
                key: object_key.to_string(),
            });
        }

        self.create_record(object_key).await
    }

    /// Link every key, keys locked or already linked are reported as failed items
    ///
    /// # Errors
    ///
    /// Will return `Err` if the records can't be read or the store can't be reached, items
    /// failing for other reasons are part of the result
    pub async fn link(&self, object_keys: &[String]) -> Result<LinkResult, LinkError> {
        let linked = self
            .records
            .linked_keys(&self.destination.name)
            .map_err(|source| self.records_error("", source))?;

        // lock what can be locked before doing anything, released when dropped
        let mut guards = Vec::new();
        let mut operable = Vec::new();
        for key in object_keys {
            if let Some(guard) = self.lock(key) {
                guards.push(guard);
                operable.push(key.as_str());
            }
        }

        let mut result = LinkResult::default();
        for key in object_keys {
            if !operable.contains(&key.as_str()) || linked.contains(key) {
                log::warn!("skipping {key}: {ALREADY_LINKED}");
                result.items.push(LinkResultItem {
                    object_key: key.clone(),
                    success: false,
                    message: Some(ALREADY_LINKED.to_string()),
                });
                continue;
            }

            let item = match self.create_record(key).await {
                Ok(_) => LinkResultItem {
                    object_key: key.clone(),
                    success: true,
                    message: None,
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(LinkError::Records {
                    source: RecordError::AlreadyLinked { .. },
                    ..
                }) => LinkResultItem {
                    object_key: key.clone(),
                    success: false,
                    message: Some(ALREADY_LINKED.to_string()),
                },
                Err(e) => LinkResultItem {
                    object_key: key.clone(),
                    success: false,
                    message: Some(e.to_string()),
                },
            };
            result.items.push(item);
        }

        drop(guards);

        log::info!(
            "linked {}/{} objects of {}",
            result.succeeded(),
            object_keys.len(),
            self.destination.name
        );

        Ok(result)
    }

    // caller holds the lock of the key
    async fn create_record(&self, object_key: &str) -> Result<AttachmentRecord, LinkError> {
        let meta = self
            .store
            .head(object_key)
            .await
            .map_err(|source| LinkError::Store {
                destination: self.destination.name.clone(),
                key: object_key.to_string(),
                source,
            })?;

        let permalink = self
            .destination
            .object_url(object_key)
            .map_err(|e| LinkError::Url {
                destination: self.destination.name.clone(),
                key: object_key.to_string(),
                message: e.to_string(),
            })?;

        let mut record = AttachmentRecord::new(
            &self.destination.name,
            object_key,
            file_name_from_key(object_key),
        );
        record.size = meta.size;
        record.media_type = meta.content_type.unwrap_or_else(|| {
            mime_guess::from_path(object_key)
                .first_or_octet_stream()
                .to_string()
        });
        record.permalink = permalink;
        record.group.clone_from(&self.group);
        record.owner.clone_from(&self.owner);

        self.records
            .create(&record)
            .map_err(|source| self.records_error(object_key, source))?;

        log::info!(
            "linked {}/{object_key} as {}",
            self.destination.name,
            record.name
        );

        Ok(record)
    }

    fn records_error(&self, key: &str, source: RecordError) -> LinkError {
        LinkError::Records {
            destination: self.destination.name.clone(),
            key: key.to_string(),
            source,
        }
    }
}

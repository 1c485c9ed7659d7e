//! Attachment records, what the content system knows about stored objects

pub mod db;

pub use self::db::SledRepository;

use chrono::Utc;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct AttachmentRecord {
    /// generated, UUID v4
    pub name: String,
    pub destination: String,
    pub object_key: String,
    pub display_name: String,
    pub size: u64,
    pub media_type: String,
    pub permalink: String,
    pub group: Option<String>,
    pub owner: Option<String>,
    /// deleting the record leaves the object in the store
    pub skip_remote_deletion: bool,
    /// unix time in milliseconds
    pub created_at: i64,
}

impl AttachmentRecord {
    #[must_use]
    pub fn new(destination: &str, object_key: &str, display_name: &str) -> Self {
        Self {
            name: uuid::Uuid::new_v4().to_string(),
            destination: destination.to_string(),
            object_key: object_key.to_string(),
            display_name: display_name.to_string(),
            size: 0,
            media_type: String::new(),
            permalink: String::new(),
            group: None,
            owner: None,
            skip_remote_deletion: false,
            created_at: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{destination}/{key} is already linked by record {name}")]
    AlreadyLinked {
        destination: String,
        key: String,
        name: String,
    },

    #[error("record {0} not found")]
    NotFound(String),

    #[error("invalid record {name}: {message}")]
    Corrupt { name: String, message: String },

    #[error("record database error: {0}")]
    Storage(#[from] sled::Error),
}

/// Where attachment records live
pub trait AttachmentRepository: Send + Sync {
    /// Object keys of `destination` referenced by a record
    ///
    /// # Errors
    ///
    /// Will return `Err` if the records can't be read
    fn linked_keys(&self, destination: &str) -> Result<HashSet<String>, RecordError>;

    /// # Errors
    ///
    /// Will return `Err` if a record already references the same object
    fn create(&self, record: &AttachmentRecord) -> Result<(), RecordError>;

    /// # Errors
    ///
    /// Will return `Err` if the records can't be read
    fn get(&self, name: &str) -> Result<Option<AttachmentRecord>, RecordError>;

    /// Record referencing `object_key` in `destination`
    ///
    /// # Errors
    ///
    /// Will return `Err` if the records can't be read
    fn find(&self, destination: &str, object_key: &str)
    -> Result<Option<AttachmentRecord>, RecordError>;

    /// Records of a destination ordered by object key
    ///
    /// # Errors
    ///
    /// Will return `Err` if the records can't be read
    fn list(&self, destination: &str) -> Result<Vec<AttachmentRecord>, RecordError>;

    /// # Errors
    ///
    /// Will return `Err` if the record does not exist
    fn update(&self, record: &AttachmentRecord) -> Result<(), RecordError>;

    /// Remove the record, returns what was removed
    ///
    /// # Errors
    ///
    /// Will return `Err` if the record does not exist
    fn delete(&self, name: &str) -> Result<AttachmentRecord, RecordError>;
}

use crate::records::{AttachmentRecord, AttachmentRepository, RecordError};
use rkyv::{rancor, util::AlignedVec};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional, abort};
use std::{collections::HashSet, path::Path};

pub const DB_RECORDS: &str = "records";
pub const DB_KEYS: &str = "object keys";

/// Records stored with `sled`, rkyv encoded and indexed by destination and object key
#[derive(Debug, Clone)]
pub struct SledRepository {
    db: sled::Db,
    records: sled::Tree,
    keys: sled::Tree,
}

impl SledRepository {
    /// # Errors
    ///
    /// Will return `Err` if can not create the db
    pub fn open(path: &Path) -> Result<Self, RecordError> {
        log::debug!("records db: {}", path.display());

        let db = sled::Config::new()
            .path(path)
            .use_compression(false)
            .mode(sled::Mode::LowSpace)
            .open()?;

        Self::with_db(db)
    }

    /// A db removed when dropped
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not create the db
    pub fn temporary() -> Result<Self, RecordError> {
        Self::with_db(sled::Config::new().temporary(true).open()?)
    }

    fn with_db(db: sled::Db) -> Result<Self, RecordError> {
        Ok(Self {
            records: db.open_tree(DB_RECORDS)?,
            keys: db.open_tree(DB_KEYS)?,
            db,
        })
    }

    /// # Errors
    ///
    /// Will return `Err` if can not `flush`
    pub fn flush(&self) -> Result<usize, RecordError> {
        Ok(self.db.flush()?)
    }

    fn load(&self, name: &[u8]) -> Result<Option<AttachmentRecord>, RecordError> {
        self.records
            .get(name)?
            .map(|bytes| decode(&String::from_utf8_lossy(name), &bytes))
            .transpose()
    }
}

fn index(destination: &str, object_key: &str) -> String {
    format!("{destination}\0{object_key}")
}

fn encode(record: &AttachmentRecord) -> Result<AlignedVec, RecordError> {
    rkyv::to_bytes::<rancor::Error>(record).map_err(|e| RecordError::Corrupt {
        name: record.name.clone(),
        message: e.to_string(),
    })
}

fn decode(name: &str, bytes: &[u8]) -> Result<AttachmentRecord, RecordError> {
    // sled values carry no alignment guarantee
    let mut aligned = AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);

    rkyv::from_bytes::<AttachmentRecord, rancor::Error>(&aligned).map_err(|e| {
        RecordError::Corrupt {
            name: name.to_string(),
            message: e.to_string(),
        }
    })
}

fn storage_error(err: TransactionError<RecordError>) -> RecordError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => RecordError::Storage(e),
    }
}

impl AttachmentRepository for SledRepository {
    fn linked_keys(&self, destination: &str) -> Result<HashSet<String>, RecordError> {
        let prefix = index(destination, "");
        self.keys
            .scan_prefix(prefix.as_bytes())
            .keys()
            .map(|key| -> Result<String, RecordError> {
                let key = key?;
                let object_key = key.get(prefix.len()..).unwrap_or_default();
                Ok(String::from_utf8_lossy(object_key).into_owned())
            })
            .collect()
    }

    fn create(&self, record: &AttachmentRecord) -> Result<(), RecordError> {
        let bytes = encode(record)?;
        let index = index(&record.destination, &record.object_key);

        (&self.records, &self.keys)
            .transaction(|(records, keys)| {
                if let Some(existing) = keys.get(index.as_bytes())? {
                    return abort(RecordError::AlreadyLinked {
                        destination: record.destination.clone(),
                        key: record.object_key.clone(),
                        name: String::from_utf8_lossy(&existing).into_owned(),
                    });
                }
                records.insert(record.name.as_bytes(), bytes.as_slice())?;
                keys.insert(index.as_bytes(), record.name.as_bytes())?;
                Ok(())
            })
            .map_err(storage_error)?;

        log::debug!(
            "created record {} for {}/{}",
            record.name,
            record.destination,
            record.object_key
        );

        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<AttachmentRecord>, RecordError> {
        self.load(name.as_bytes())
    }

    fn find(
        &self,
        destination: &str,
        object_key: &str,
    ) -> Result<Option<AttachmentRecord>, RecordError> {
        match self.keys.get(index(destination, object_key).as_bytes())? {
            Some(name) => self.load(&name),
            None => Ok(None),
        }
    }

    fn list(&self, destination: &str) -> Result<Vec<AttachmentRecord>, RecordError> {
        let prefix = index(destination, "");
        let mut records = Vec::new();
        for name in self.keys.scan_prefix(prefix.as_bytes()).values() {
            if let Some(record) = self.load(&name?)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn update(&self, record: &AttachmentRecord) -> Result<(), RecordError> {
        let bytes = encode(record)?;
        let index = index(&record.destination, &record.object_key);

        (&self.records, &self.keys)
            .transaction(|(records, keys)| {
                let Some(old) = records.get(record.name.as_bytes())? else {
                    return abort(RecordError::NotFound(record.name.clone()));
                };

                // the object may have moved, onto a key nobody else links
                let old =
                    decode(&record.name, &old).map_err(ConflictableTransactionError::Abort)?;
                let old_index = self::index(&old.destination, &old.object_key);
                if old_index != index
                    && let Some(existing) = keys.get(index.as_bytes())?
                {
                    return abort(RecordError::AlreadyLinked {
                        destination: record.destination.clone(),
                        key: record.object_key.clone(),
                        name: String::from_utf8_lossy(&existing).into_owned(),
                    });
                }
                keys.remove(old_index.as_bytes())?;

                records.insert(record.name.as_bytes(), bytes.as_slice())?;
                keys.insert(index.as_bytes(), record.name.as_bytes())?;
                Ok(())
            })
            .map_err(storage_error)
    }

    fn delete(&self, name: &str) -> Result<AttachmentRecord, RecordError> {
        (&self.records, &self.keys)
            .transaction(|(records, keys)| {
                let Some(bytes) = records.remove(name.as_bytes())? else {
                    return abort(RecordError::NotFound(name.to_string()));
                };
                let record = decode(name, &bytes).map_err(ConflictableTransactionError::Abort)?;
                keys.remove(index(&record.destination, &record.object_key).as_bytes())?;
                Ok(record)
            })
            .map_err(storage_error)
    }
}

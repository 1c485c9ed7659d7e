//! Listing the objects of a destination against the attachment records
//!
//! `list_unlinked` walks the store listing until a page of unlinked objects is filled, the
//! returned cursor resumes right after the last object handed out. Listings running while
//! objects are added or removed may skip or repeat objects, and `has_more` only tells that the
//! page was full.

use crate::{
    destination::Destination,
    records::{AttachmentRepository, RecordError},
    store::{ListRequest, ObjectStore, StoreError},
};
use std::collections::HashSet;
use thiserror::Error;

/// An object of the store listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub key: String,
    /// last segment of the key
    pub display_name: String,
    pub size: u64,
    pub last_modified: Option<String>,
    /// an attachment record references the key
    pub linked: bool,
}

impl ObjectDescriptor {
    #[must_use]
    pub fn new(key: &str, size: u64, last_modified: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            display_name: key.rsplit('/').next().unwrap_or(key).to_string(),
            size,
            last_modified,
            linked: false,
        }
    }
}

/// One page of the store listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectDescriptor>,
    pub current_token: Option<String>,
    pub next_token: Option<String>,
    pub is_truncated: bool,
}

/// Where a scan for unlinked objects resumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// store token of the page to read first
    pub token: Option<String>,
    /// last object handed out, skipped with everything before it
    pub continuation_object_key: Option<String>,
}

/// A page of unlinked objects
#[derive(Debug, Clone, Default)]
pub struct UnlinkedPage {
    pub objects: Vec<ObjectDescriptor>,
    pub current_token: Option<String>,
    pub continuation_object_key: Option<String>,
    /// store token of the last page read
    pub next_token: Option<String>,
    pub next_continuation_object_key: Option<String>,
    /// the page is full
    pub has_more: bool,
}

impl UnlinkedPage {
    /// Cursor for the following page
    #[must_use]
    pub fn next_cursor(&self) -> Cursor {
        Cursor {
            token: self.next_token.clone(),
            continuation_object_key: self.next_continuation_object_key.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("listing {bucket}/{}: {source}", .prefix.as_deref().unwrap_or_default())]
    Store {
        bucket: String,
        prefix: Option<String>,
        #[source]
        source: StoreError,
    },

    #[error("reading the records of {destination}: {source}")]
    Records {
        destination: String,
        #[source]
        source: RecordError,
    },
}

/// Objects linked by a record in `destination`
fn linked_keys<R>(records: &R, destination: &Destination) -> Result<HashSet<String>, ScanError>
where
    R: AttachmentRepository + ?Sized,
{
    records
        .linked_keys(&destination.name)
        .map_err(|source| ScanError::Records {
            destination: destination.name.clone(),
            source,
        })
}

/// Read one page of `destination`, delimited by `/`, directory markers left out
///
/// # Errors
///
/// Will return `Err` if the listing or the records can't be read
pub async fn list_objects<S, R>(
    store: &S,
    records: &R,
    destination: &Destination,
    token: Option<&str>,
    page_size: u32,
    file_prefix: Option<&str>,
) -> Result<ObjectPage, ScanError>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    let prefix = destination.build_prefix(file_prefix);
    let linked = linked_keys(records, destination)?;
    fetch_page(store, prefix, token, page_size, &linked).await
}

async fn fetch_page<S: ObjectStore>(
    store: &S,
    prefix: Option<String>,
    token: Option<&str>,
    page_size: u32,
    linked: &HashSet<String>,
) -> Result<ObjectPage, ScanError> {
    let request = ListRequest {
        prefix,
        delimiter: Some("/".to_string()),
        continuation_token: token.filter(|t| !t.is_empty()).map(ToString::to_string),
        max_keys: page_size.max(1),
    };

    log::debug!(
        "list {}: prefix {:?}, token {:?}",
        store.bucket(),
        request.prefix,
        request.continuation_token
    );

    let page = store.list(&request).await.map_err(|source| ScanError::Store {
        bucket: store.bucket().to_string(),
        prefix: request.prefix.clone(),
        source,
    })?;

    let objects = page
        .objects
        .into_iter()
        .filter(|object| !object.key.ends_with('/'))
        .map(|object| {
            let mut descriptor =
                ObjectDescriptor::new(&object.key, object.size, object.last_modified);
            descriptor.linked = linked.contains(&object.key);
            descriptor
        })
        .collect();

    Ok(ObjectPage {
        objects,
        current_token: request.continuation_token,
        next_token: page.next_token,
        is_truncated: page.is_truncated,
    })
}

/// Read a single key under the location of `destination`, the cheapest call showing the
/// endpoint, the credentials and the bucket work together
///
/// # Errors
///
/// Will return `Err` if the store refuses or can't be reached
pub async fn check_destination<S: ObjectStore>(
    store: &S,
    destination: &Destination,
) -> Result<ObjectPage, ScanError> {
    let prefix = destination.build_prefix(None);
    log::info!(
        "checking {} with {}/{}",
        destination.name,
        store.bucket(),
        prefix.as_deref().unwrap_or_default()
    );
    fetch_page(store, prefix, None, 1, &HashSet::new()).await
}

/// Up to `page_size` objects of `destination` no record references, read from as many
/// store pages as needed
///
/// # Errors
///
/// Will return `Err` if the listing or the records can't be read
pub async fn list_unlinked<S, R>(
    store: &S,
    records: &R,
    destination: &Destination,
    cursor: &Cursor,
    page_size: u32,
    file_prefix: Option<&str>,
) -> Result<UnlinkedPage, ScanError>
where
    S: ObjectStore,
    R: AttachmentRepository + ?Sized,
{
    let page_size = page_size.max(1);
    let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
    let prefix = destination.build_prefix(file_prefix);
    let linked = linked_keys(records, destination)?;
    let continuation = cursor.continuation_object_key.as_deref();

    let mut unlinked: Vec<ObjectDescriptor> = Vec::new();
    let mut matched = continuation.is_none();
    let mut token = cursor.token.clone();

    // token of the last page read
    let mut last_token;

    loop {
        let page = fetch_page(store, prefix.clone(), token.as_deref(), page_size, &linked).await?;
        last_token = page.current_token;

        let mut objects = page.objects;
        if !matched
            && let Some(position) = objects
                .iter()
                .position(|o| Some(o.key.as_str()) == continuation)
        {
            // everything up to the continuation object was handed out already
            unlinked.clear();
            objects.drain(..=position);
            matched = true;
        }

        unlinked.extend(objects.into_iter().filter(|o| !o.linked));
        token = page.next_token;

        log::debug!(
            "unlinked objects: {}, next token: {:?}",
            unlinked.len(),
            token
        );

        if token.is_none() || unlinked.len() >= limit {
            break;
        }
    }

    unlinked.truncate(limit);

    Ok(UnlinkedPage {
        next_continuation_object_key: unlinked.last().map(|o| o.key.clone()),
        has_more: unlinked.len() == limit,
        objects: unlinked,
        current_token: cursor.token.clone(),
        continuation_object_key: cursor.continuation_object_key.clone(),
        next_token: last_token,
    })
}

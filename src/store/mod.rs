//! The calls the upload engine, the scanner and the linker make against an object store
//!
//! `S3` talks to the real thing, `MemoryStore` keeps everything in process.

mod error;
pub mod memory;

pub use self::{error::StoreError, memory::MemoryStore};

use crate::s3::{S3, actions};
use bytes::Bytes;
use std::{collections::BTreeMap, future::Future};

/// A part acknowledged by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub number: u16,
    pub etag: String,
}

/// Metadata returned by a head request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// One entry of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ListedObject>,
    pub next_token: Option<String>,
    pub is_truncated: bool,
}

pub trait ObjectStore: Send + Sync {
    fn bucket(&self) -> &str;

    /// Open a multipart upload, returns the upload id
    fn create_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Upload one part, returns its `ETag`
    fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        number: u16,
        body: Bytes,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// A missing object is `StoreError::NotFound`
    fn head(&self, key: &str) -> impl Future<Output = Result<ObjectMeta, StoreError>> + Send;

    fn list(&self, request: &ListRequest)
    -> impl Future<Output = Result<ListPage, StoreError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl ObjectStore for S3 {
    fn bucket(&self) -> &str {
        S3::bucket(self).unwrap_or_default()
    }

    async fn create_multipart(&self, key: &str, content_type: &str) -> Result<String, StoreError> {
        let action = actions::CreateMultipartUpload::new(key, Some(content_type));
        let response = action.request(self).await?;
        Ok(response.upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        number: u16,
        body: Bytes,
    ) -> Result<String, StoreError> {
        let action = actions::UploadPart::new(key, number, upload_id, body);
        Ok(action.request(self).await?)
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StoreError> {
        let action = actions::CompleteMultipartUpload::new(key, upload_id, parts);
        let response = action.request(self).await?;
        log::debug!("completed {}, ETag: {}", response.key, response.e_tag);
        Ok(())
    }

    async fn head(&self, key: &str) -> Result<ObjectMeta, StoreError> {
        let headers = actions::HeadObject::new(key)
            .request(self)
            .await
            .map_err(|e| match StoreError::from(e) {
                StoreError::NotFound(_) => StoreError::NotFound(key.to_string()),
                other => other,
            })?;
        Ok(object_meta(key, &headers))
    }

    async fn list(&self, request: &ListRequest) -> Result<ListPage, StoreError> {
        let result = actions::ListObjectsV2::new(request).request(self).await?;

        Ok(ListPage {
            objects: result
                .contents
                .into_iter()
                .map(|object| ListedObject {
                    key: object.key,
                    size: object.size,
                    last_modified: object.last_modified,
                })
                .collect(),
            next_token: result.next_continuation_token,
            is_truncated: result.is_truncated,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        Ok(actions::DeleteObject::new(key).request(self).await?)
    }
}

fn object_meta(key: &str, headers: &BTreeMap<String, String>) -> ObjectMeta {
    ObjectMeta {
        key: key.to_string(),
        size: headers
            .get("content-length")
            .and_then(|length| length.parse().ok())
            .unwrap_or_default(),
        content_type: headers.get("content-type").cloned(),
        etag: headers.get("etag").cloned(),
        last_modified: headers.get("last-modified").cloned(),
    }
}

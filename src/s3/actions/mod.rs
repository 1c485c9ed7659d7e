//! Actions
//! <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>

use crate::{
    s3::{S3, responses::ErrorResponse, signature::Signature, tools::write_hex_bytes},
    store::StoreError,
};
use anyhow::{Result, anyhow};
use quick_xml::de::from_str;
use reqwest::{Method, Response};
use std::collections::BTreeMap;
use url::Url;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListObjectsV2.html>
mod listobjectsv2;
pub use self::listobjectsv2::ListObjectsV2;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_HeadObject.html>
mod headobject;
pub use self::headobject::HeadObject;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateMultipartUpload.html>
mod createmultipartupload;
pub use self::createmultipartupload::CreateMultipartUpload;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html>
mod uploadpart;
pub use self::uploadpart::UploadPart;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
mod completemultipartupload;
pub use self::completemultipartupload::CompleteMultipartUpload;

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_DeleteObject.html>
mod deleteobject;
pub use self::deleteobject::DeleteObject;

pub trait Action {
    // headers to send in the request
    fn headers(&self) -> Option<BTreeMap<&str, &str>>;

    // method to use GET/PUT...
    /// # Errors
    ///
    /// Will return `Err` if the method is not valid
    fn http_method(&self) -> Result<Method>;

    // URL query pairs
    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>>;

    // URL path
    fn path(&self) -> Option<Vec<&str>>;

    /// # Errors
    ///
    /// Will return `Err` if the signature can not be created
    fn sign(
        &self,
        s3: &S3,
        hash_payload: &[u8],
        md5: Option<&str>,
        content_length: Option<usize>,
    ) -> Result<(Url, BTreeMap<String, String>)> {
        let mut url = s3.endpoint()?;

        // object key, one segment per "/"
        if let Some(path) = self.path() {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| anyhow!("cannot be base: {}", s3.region().endpoint()))?;
            segments.pop_if_empty();
            for p in path {
                segments.push(p);
            }
        }

        if let Some(pairs) = &self.query_pairs() {
            for (k, v) in pairs {
                url.query_pairs_mut().append_pair(k, v);
            }
        }

        let mut signature = Signature::new(s3, "s3", self.http_method()?);
        let headers = signature.sign(
            &url,
            &write_hex_bytes(hash_payload),
            md5,
            content_length,
            self.headers(),
        );
        Ok((url, headers))
    }
}

/// Split an object key into URL path segments
pub(crate) fn key_path(key: &str) -> Vec<&str> {
    key.split('/').collect()
}

/// Build a `StoreError` from an unsuccessful response, the body is parsed as an S3 error
pub async fn response_error(response: Response) -> StoreError {
    let status = response.status().as_u16();

    if let Some(rid) = response.headers().get("x-amz-request-id") {
        log::debug!("request id: {}", rid.to_str().unwrap_or_default());
    }

    let body = response.text().await.unwrap_or_default();

    match from_str::<ErrorResponse>(&body) {
        Ok(e) => StoreError::from_status(status, e.code, e.message),
        Err(_) => StoreError::from_status(status, format!("HTTP {status}"), body),
    }
}

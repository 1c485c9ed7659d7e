use crate::{
    s3::actions::{Action, response_error},
    s3::responses::ListBucketResult,
    s3::{S3, request, tools},
    store::ListRequest,
};
use anyhow::Result;
use quick_xml::de::from_str;
use reqwest::Method;
use std::collections::BTreeMap;

/// One page of the bucket listing, version 2 of the API
#[derive(Debug)]
pub struct ListObjectsV2<'a> {
    list: &'a ListRequest,
    max_keys: String,
}

impl<'a> ListObjectsV2<'a> {
    #[must_use]
    pub fn new(list: &'a ListRequest) -> Self {
        Self {
            list,
            // S3 returns at most 1000 keys whatever is asked
            max_keys: list.max_keys.clamp(1, 1000).to_string(),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the listing can't be parsed
    pub async fn request(&self, s3: &S3) -> Result<ListBucketResult> {
        let (url, headers) = &self.sign(s3, tools::sha256_digest("").as_ref(), None, None)?;

        let response = request::request(s3, url.clone(), self.http_method()?, headers, None).await?;

        if !response.status().is_success() {
            return Err(response_error(response).await.into());
        }

        let page: ListBucketResult = from_str(&response.text().await?)?;

        log::debug!(
            "listed {} objects of {}, truncated: {}",
            page.contents.len(),
            page.name,
            page.is_truncated
        );

        Ok(page)
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_ListObjectsV2.html
impl Action for ListObjectsV2<'_> {
    fn http_method(&self) -> Result<Method> {
        Ok(Method::GET)
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map = BTreeMap::from([("list-type", "2"), ("max-keys", self.max_keys.as_str())]);

        let optional = [
            ("continuation-token", &self.list.continuation_token),
            ("delimiter", &self.list.delimiter),
            ("prefix", &self.list.prefix),
        ];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                map.insert(name, value);
            }
        }

        Some(map)
    }
}

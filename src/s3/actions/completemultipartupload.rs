//! Amazon S3 multipart upload limits
//! Maximum object size 5 TB
//! Maximum number of parts per upload  10,000
//! <https://docs.aws.amazon.com/AmazonS3/latest/dev/qfacts.html>

use crate::{
    s3::actions::{Action, key_path, response_error},
    s3::responses::{CompleteMultipartUploadResult, ErrorResponse},
    s3::{S3, request, tools},
    store::{CompletedPart, StoreError},
};
use anyhow::Result;
use bytes::Bytes;
use quick_xml::{de::from_str, se::to_string};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct CompleteMultipartUpload<'a> {
    key: &'a str,
    upload_id: &'a str,
    parts: Vec<&'a CompletedPart>,
}

#[derive(Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
struct Body<'a> {
    #[serde(rename = "Part")]
    parts: Vec<PartXml<'a>>,
}

#[derive(Serialize)]
struct PartXml<'a> {
    #[serde(rename = "ETag")]
    etag: &'a str,
    #[serde(rename = "PartNumber")]
    number: u16,
}

impl<'a> CompleteMultipartUpload<'a> {
    /// Parts are sorted by part number, the store rejects any other order
    #[must_use]
    pub fn new(key: &'a str, upload_id: &'a str, parts: &'a [CompletedPart]) -> Self {
        let mut parts: Vec<&CompletedPart> = parts.iter().collect();
        parts.sort_by_key(|part| part.number);
        Self {
            key,
            upload_id,
            parts,
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if the body can not be serialized
    pub fn body(&self) -> Result<String> {
        let body = Body {
            parts: self
                .parts
                .iter()
                .map(|part| PartXml {
                    etag: &part.etag,
                    number: part.number,
                })
                .collect(),
        };
        Ok(to_string(&body)?)
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<CompleteMultipartUploadResult> {
        let body = self.body()?;
        let digest = tools::sha256_digest(&body);
        let (url, headers) = &self.sign(s3, digest.as_ref(), None, Some(body.len()))?;

        let response = request::request(
            s3,
            url.clone(),
            self.http_method()?,
            headers,
            Some(Bytes::from(body)),
        )
        .await?;

        if response.status().is_success() {
            // errors can arrive with a 200 once the response started
            let text = response.text().await?;
            match from_str::<CompleteMultipartUploadResult>(&text) {
                Ok(result) => Ok(result),
                Err(e) => match from_str::<ErrorResponse>(&text) {
                    Ok(error) => Err(StoreError::from_status(500, error.code, error.message).into()),
                    Err(_) => Err(e.into()),
                },
            }
        } else {
            Err(response_error(response).await.into())
        }
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CompleteMultipartUpload.html>
impl Action for CompleteMultipartUpload<'_> {
    fn http_method(&self) -> Result<Method> {
        Ok(Method::from_bytes(b"POST")?)
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("uploadId", self.upload_id);
        Some(map)
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_path(self.key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::s3::{Credentials, Protocol, Region};
    use secrecy::SecretString;

    fn part(number: u16, etag: &str) -> CompletedPart {
        CompletedPart {
            number,
            etag: etag.to_string(),
        }
    }

    #[test]
    fn test_body_sorted_by_part_number() {
        let parts = vec![part(3, "c"), part(1, "a"), part(2, "b")];
        let action = CompleteMultipartUpload::new("a.png", "abc", &parts);
        let body = action.body().unwrap();
        assert!(body.starts_with("<CompleteMultipartUpload><Part>"));
        let one = body.find("<PartNumber>1</PartNumber>").unwrap();
        let two = body.find("<PartNumber>2</PartNumber>").unwrap();
        let three = body.find("<PartNumber>3</PartNumber>").unwrap();
        assert!(one < two && two < three);
        assert!(body.contains("<ETag>a</ETag><PartNumber>1</PartNumber>"));
    }

    #[tokio::test]
    async fn test_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/media/a.png?uploadId=abc")
            .match_body(mockito::Matcher::Regex(
                "<PartNumber>1</PartNumber>.*<PartNumber>2</PartNumber>".to_string(),
            ))
            .with_status(200)
            .with_body("<CompleteMultipartUploadResult><Location>http://x/media/a.png</Location><Bucket>media</Bucket><Key>a.png</Key><ETag>\"e-2\"</ETag></CompleteMultipartUploadResult>")
            .create_async()
            .await;

        let s3 = S3::new(
            &Credentials::new("access", &SecretString::new("secret".into())),
            &Region::custom(None, &server.host_with_port()),
            Some("media".to_string()),
            true,
        )
        .with_protocol(Protocol::Http);

        let parts = vec![part(2, "b"), part(1, "a")];
        let result = CompleteMultipartUpload::new("a.png", "abc", &parts)
            .request(&s3)
            .await
            .unwrap();
        assert_eq!(result.key, "a.png");
        mock.assert_async().await;
    }
}

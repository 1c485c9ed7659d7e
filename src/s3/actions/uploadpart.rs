use crate::{
    s3::actions::{Action, key_path, response_error},
    s3::{S3, request, tools},
};
use anyhow::{Result, anyhow};
use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct UploadPart<'a> {
    key: &'a str,
    part_number: String,
    upload_id: &'a str,
    body: Bytes,
}

impl<'a> UploadPart<'a> {
    #[must_use]
    pub fn new(key: &'a str, part_number: u16, upload_id: &'a str, body: Bytes) -> Self {
        Self {
            key,
            part_number: part_number.to_string(),
            upload_id,
            body,
        }
    }

    /// Returns the `ETag` of the part
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, s3: &S3) -> Result<String> {
        let sha256 = tools::sha256_digest(&self.body);
        let md5 = tools::base64_md5(&self.body);
        let (url, headers) =
            &self.sign(s3, sha256.as_ref(), Some(&md5), Some(self.body.len()))?;

        let response = request::request(
            s3,
            url.clone(),
            self.http_method()?,
            headers,
            Some(self.body.clone()),
        )
        .await?;

        if response.status().is_success() {
            match response.headers().get("ETag") {
                Some(etag) => Ok(etag.to_str()?.to_string()),
                None => Err(anyhow!("missing ETag for part {}", self.part_number)),
            }
        } else {
            Err(response_error(response).await.into())
        }
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_UploadPart.html
impl Action for UploadPart<'_> {
    fn http_method(&self) -> Result<Method> {
        Ok(Method::from_bytes(b"PUT")?)
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("partNumber", &self.part_number);
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

    fn s3(endpoint: &str) -> S3 {
        S3::new(
            &Credentials::new("access", &SecretString::new("secret".into())),
            &Region::custom(None, endpoint),
            Some("media".to_string()),
            true,
        )
        .with_protocol(Protocol::Http)
    }

    #[test]
    fn test_query_pairs() {
        let action = UploadPart::new("a.png", 7, "abc", Bytes::from_static(b"data"));
        let pairs = action.query_pairs().unwrap();
        assert_eq!(Some(&"7"), pairs.get("partNumber"));
        assert_eq!(Some(&"abc"), pairs.get("uploadId"));
    }

    #[test]
    fn test_sign_headers() {
        let body = Bytes::from_static(b"hello world");
        let action = UploadPart::new("a.png", 1, "abc", body.clone());
        let md5 = tools::base64_md5(&body);
        let (url, headers) = action
            .sign(
                &s3("127.0.0.1:9000"),
                tools::sha256_digest(&body).as_ref(),
                Some(&md5),
                Some(body.len()),
            )
            .unwrap();
        assert_eq!(
            "http://127.0.0.1:9000/media/a.png?partNumber=1&uploadId=abc",
            url.as_str()
        );
        assert_eq!(
            Some(&"XrY7u+Ae7tCTyyK7j1rNww==".to_string()),
            headers.get("content-md5")
        );
        assert_eq!(Some(&"11".to_string()), headers.get("content-length"));
    }

    #[tokio::test]
    async fn test_request_returns_etag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/media/a.png?partNumber=2&uploadId=abc")
            .match_body("chunk")
            .with_status(200)
            .with_header("ETag", "\"etag-2\"")
            .create_async()
            .await;

        let etag = UploadPart::new("a.png", 2, "abc", Bytes::from_static(b"chunk"))
            .request(&s3(&server.host_with_port()))
            .await
            .unwrap();
        assert_eq!(etag, "\"etag-2\"");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_missing_etag() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/media/a.png?partNumber=1&uploadId=abc")
            .with_status(200)
            .create_async()
            .await;

        let err = UploadPart::new("a.png", 1, "abc", Bytes::from_static(b"chunk"))
            .request(&s3(&server.host_with_port()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing ETag"));
    }
}

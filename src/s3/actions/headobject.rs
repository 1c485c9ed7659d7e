use crate::{
    s3::actions::{Action, key_path, response_error},
    s3::{S3, request, tools},
};
use anyhow::Result;
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct HeadObject<'a> {
    key: &'a str,
}

impl<'a> HeadObject<'a> {
    #[must_use]
    pub const fn new(key: &'a str) -> Self {
        Self { key }
    }

    /// Returns the response headers, lowercase names
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request, a missing object is a `StoreError::NotFound`
    pub async fn request(&self, s3: &S3) -> Result<BTreeMap<String, String>> {
        let (url, headers) = &self.sign(s3, tools::sha256_digest("").as_ref(), None, None)?;
        let response = request::request(s3, url.clone(), self.http_method()?, headers, None).await?;
        if response.status().is_success() {
            let mut h: BTreeMap<String, String> = BTreeMap::new();
            for (key, value) in response.headers() {
                if !value.is_empty() {
                    h.insert(key.as_str().to_string(), value.to_str()?.to_string());
                }
            }
            Ok(h)
        } else {
            Err(response_error(response).await.into())
        }
    }
}

// https://docs.aws.amazon.com/AmazonS3/latest/API/API_HeadObject.html
impl Action for HeadObject<'_> {
    fn http_method(&self) -> Result<Method> {
        Ok(Method::from_bytes(b"HEAD")?)
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(key_path(self.key))
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        s3::{Credentials, Protocol, Region},
        store::StoreError,
    };
    use secrecy::SecretString;

    fn s3(endpoint: &str, path_style: bool) -> S3 {
        S3::new(
            &Credentials::new("access", &SecretString::new("secret".into())),
            &Region::custom(None, endpoint),
            Some("media".to_string()),
            path_style,
        )
        .with_protocol(Protocol::Http)
    }

    #[test]
    fn test_sign_virtual_host() {
        let action = HeadObject::new("docs/my file.pdf");
        let (url, _) = action
            .sign(
                &s3("s3.example.com", false),
                tools::sha256_digest("").as_ref(),
                None,
                None,
            )
            .unwrap();
        assert_eq!(
            "http://media.s3.example.com/docs/my%20file.pdf",
            url.as_str()
        );
    }

    #[tokio::test]
    async fn test_request_headers() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/media/a.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_header("content-length", "42")
            .create_async()
            .await;

        let headers = HeadObject::new("a.png")
            .request(&s3(&server.host_with_port(), true))
            .await
            .unwrap();
        assert_eq!(headers.get("content-type").unwrap(), "image/png");
        assert_eq!(headers.get("content-length").unwrap(), "42");
    }

    #[tokio::test]
    async fn test_request_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/media/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let err = HeadObject::new("missing.png")
            .request(&s3(&server.host_with_port(), true))
            .await
            .unwrap_err();
        assert!(StoreError::from(err).is_not_found());
    }
}

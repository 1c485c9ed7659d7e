//! `MinIO` test helper for integration tests
//!
//! Provides utilities to spin up a `MinIO` container for S3 API testing.
//! Supports both Docker and Podman container runtimes.
//!
//! ## Usage with Podman
//!
//! Set the following environment variables before running tests:
//! ```bash
//! export DOCKER_HOST=unix:///run/user/$(id -u)/podman/podman.sock
//! export TESTCONTAINERS_DOCKER_SOCKET_OVERRIDE=/run/user/$(id -u)/podman/podman.sock
//! cargo test --test e2e_minio -- --ignored
//! ```

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use reqwest::Method;
use s3attach::s3::{
    Credentials, Protocol, Region, S3,
    actions::Action,
    request, tools,
};
use secrecy::SecretString;
use std::{collections::BTreeMap, time::Duration};
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt,
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
};
use tokio::time::sleep;

/// Default `MinIO` credentials for testing
pub const MINIO_ROOT_USER: &str = "minioadmin";
pub const MINIO_ROOT_PASSWORD: &str = "minioadmin";

/// `MinIO` test fixture that manages container lifecycle
pub struct MinioContainer {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

impl MinioContainer {
    /// Start a `MinIO` container, the image is pulled when not cached
    pub async fn start() -> Self {
        let image = GenericImage::new("minio/minio", "latest")
            .with_wait_for(WaitFor::message_on_stderr("MinIO Object Storage Server"))
            .with_env_var("MINIO_ROOT_USER", MINIO_ROOT_USER)
            .with_env_var("MINIO_ROOT_PASSWORD", MINIO_ROOT_PASSWORD)
            .with_cmd(vec!["server", "/data", "--console-address", ":9001"]);

        let container = image
            .start()
            .await
            .expect("Failed to start MinIO container");

        let port = container
            .get_host_port_ipv4(ContainerPort::Tcp(9000))
            .await
            .expect("Failed to get MinIO port");

        let endpoint = format!("http://127.0.0.1:{port}");

        // Give MinIO a moment to fully initialize
        sleep(Duration::from_secs(2)).await;

        Self {
            container,
            endpoint,
            access_key: MINIO_ROOT_USER.to_string(),
            secret_key: MINIO_ROOT_PASSWORD.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Wait for `MinIO` to accept connections
    pub async fn wait_for_ready(&self) -> anyhow::Result<()> {
        let max_attempts = 30;
        let url = format!("{}/minio/health/live", self.endpoint);

        for _ in 0..max_attempts {
            match reqwest::Client::new().get(&url).send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                _ => sleep(Duration::from_millis(500)).await,
            }
        }

        Err(anyhow::anyhow!(
            "MinIO did not become ready after {max_attempts} attempts"
        ))
    }
}

// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_CreateBucket.html>
struct CreateBucket<'a> {
    bucket: &'a str,
}

impl Action for CreateBucket<'_> {
    fn http_method(&self) -> anyhow::Result<Method> {
        Ok(Method::PUT)
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Option<Vec<&str>> {
        Some(vec![self.bucket])
    }
}

/// Create a bucket with a signed PUT, an existing bucket (409) is fine
pub async fn create_bucket(
    endpoint: &str,
    access_key: &str,
    secret_key: &str,
    bucket_name: &str,
) -> anyhow::Result<()> {
    let host = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    let region = Region::custom(None, host);
    let credentials = Credentials::new(access_key, &SecretString::new(secret_key.into()));
    let s3 = S3::new(&credentials, &region, None, true).with_protocol(Protocol::Http);

    let action = CreateBucket {
        bucket: bucket_name,
    };
    let (url, headers) = action.sign(&s3, tools::sha256_digest("").as_ref(), None, None)?;
    let response = request::request(&s3, url, action.http_method()?, &headers, None).await?;

    if response.status().is_success() || response.status().as_u16() == 409 {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Failed to create bucket: {} - {}",
            response.status(),
            response.text().await?
        ))
    }
}

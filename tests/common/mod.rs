//! Common test helpers for integration tests
//!
//! - `MinioContext`: `MinIO` test environment (external or container-based)
//! - Config file helpers: temporary s3attach config files
//! - Binary helpers: run s3attach with a config and a records db
//! - Engine helpers: in-memory store bodies and destinations

#![allow(
    dead_code,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

mod helpers;

pub use helpers::minio::{MINIO_ROOT_PASSWORD, MINIO_ROOT_USER, MinioContainer, create_bucket};

use bytes::Bytes;
use futures::{Stream, stream};
use s3attach::{destination::Destination, s3::Protocol};
use secrecy::SecretString;
use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::NamedTempFile;

/// Create a temporary config.yml with one destination called `s3`
pub fn create_config_file(
    endpoint: &str,
    access_key: &str,
    secret_key: &str,
    bucket: &str,
) -> NamedTempFile {
    let config_content = format!(
        r"---
destinations:
  s3:
    endpoint: {endpoint}
    protocol: http
    path_style: true
    bucket: {bucket}
    access_key: {access_key}
    secret_key: {secret_key}
    location: uploads
    duplicate_handling: random-alphanumeric
"
    );

    let mut config_file = NamedTempFile::new().expect("Failed to create temp config file");
    config_file
        .write_all(config_content.as_bytes())
        .expect("Failed to write config");
    config_file.flush().expect("Failed to flush config");
    config_file
}

/// `MinIO` test context - either external or testcontainer-based
pub enum MinioContext {
    External {
        endpoint: String,
        access_key: String,
        secret_key: String,
    },
    Container(Box<MinioContainer>),
}

impl MinioContext {
    /// Get or start `MinIO` - uses external if `MINIO_ENDPOINT` is set, otherwise starts container
    pub async fn get_or_start() -> Self {
        if let Ok(endpoint) = env::var("MINIO_ENDPOINT") {
            let access_key =
                env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| MINIO_ROOT_USER.to_string());
            let secret_key =
                env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| MINIO_ROOT_PASSWORD.to_string());

            println!("Using external MinIO at {endpoint}");

            Self::External {
                endpoint,
                access_key,
                secret_key,
            }
        } else {
            println!("Starting MinIO testcontainer");
            let container = MinioContainer::start().await;
            container.wait_for_ready().await.expect("MinIO ready");
            Self::Container(Box::new(container))
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            Self::External { endpoint, .. } => endpoint,
            Self::Container(c) => c.endpoint(),
        }
    }

    pub fn access_key(&self) -> &str {
        match self {
            Self::External { access_key, .. } => access_key,
            Self::Container(c) => &c.access_key,
        }
    }

    pub fn secret_key(&self) -> &str {
        match self {
            Self::External { secret_key, .. } => secret_key,
            Self::Container(c) => &c.secret_key,
        }
    }

    pub async fn create_bucket(&self, bucket_name: &str) -> anyhow::Result<()> {
        create_bucket(
            self.endpoint(),
            self.access_key(),
            self.secret_key(),
            bucket_name,
        )
        .await
    }

    /// Destination `s3` pointing at `bucket`
    pub fn destination(&self, bucket: &str) -> Destination {
        let mut destination = Destination::new("s3", bucket);
        destination.endpoint = Some(self.endpoint().to_string());
        destination.protocol = Protocol::Http;
        destination.path_style = true;
        destination.access_key = self.access_key().to_string();
        destination.secret_key = SecretString::new(self.secret_key().into());
        destination.location = "uploads".to_string();
        destination
    }
}

/// Get the path to the s3attach binary (builds it if needed)
pub fn get_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("target");
    path.push("debug");
    path.push("s3attach");

    if !path.exists() {
        let output = Command::new("cargo")
            .args(["build", "--bin", "s3attach"])
            .output()
            .expect("Failed to build s3attach binary");

        assert!(
            output.status.success(),
            "Failed to build s3attach: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    path
}

/// Run s3attach against `MinIO` with a fresh config file and the records db in `db`
pub fn run_with_minio(
    minio: &MinioContext,
    bucket: &str,
    db: &Path,
    args: &[&str],
) -> std::process::Output {
    let config_file =
        create_config_file(minio.endpoint(), minio.access_key(), minio.secret_key(), bucket);
    let config_path = config_file.path().to_str().expect("Invalid config path");

    let output = Command::new(get_binary())
        .arg("--config")
        .arg(config_path)
        .arg("--db")
        .arg(db)
        .args(args)
        .output()
        .expect("Failed to execute s3attach");

    // Keep config_file alive until command completes
    drop(config_file);

    output
}

/// Body of `data` split at every `cuts` offset
pub fn chunked_body(
    data: &[u8],
    cuts: &[usize],
) -> impl Stream<Item = io::Result<Bytes>> + Unpin + use<> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        let cut = cut.clamp(start, data.len());
        chunks.push(Ok(Bytes::copy_from_slice(&data[start..cut])));
        start = cut;
    }
    chunks.push(Ok(Bytes::copy_from_slice(&data[start..])));
    stream::iter(chunks)
}

/// Deterministic bytes, `len` long
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect()
}

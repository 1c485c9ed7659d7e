pub mod actions;
pub mod credentials;
pub mod limits;
pub mod region;
pub mod request;
pub mod responses;
pub mod signature;
pub mod tools;

pub use self::{credentials::Credentials, region::Region, signature::Signature};

use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::{fmt, time::Duration};
use url::Url;

/// Scheme used to reach the endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3 {
    // AWS Credentials
    credentials: Credentials,
    // AWS Region
    region: Region,
    // bucket name
    bucket: Option<String>,
    // use <endpoint>/<bucket> instead of <bucket>.<endpoint>
    path_style: bool,
    protocol: Protocol,
    // per request timeout
    timeout: Option<Duration>,
    client: reqwest::Client,
}

// Amazon S3 API Reference
// <https://docs.aws.amazon.com/AmazonS3/latest/API/API_Operations.html>
impl S3 {
    #[must_use]
    pub fn new(
        credentials: &Credentials,
        region: &Region,
        bucket: Option<String>,
        path_style: bool,
    ) -> Self {
        Self {
            credentials: credentials.clone(),
            region: region.clone(),
            bucket,
            path_style,
            protocol: Protocol::default(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub const fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL of the bucket, path-style or virtual-hosted style
    ///
    /// # Errors
    ///
    /// Will return `Err` if the endpoint is not a valid URL
    pub fn endpoint(&self) -> Result<Url> {
        let host = self.region.endpoint();
        let url = match &self.bucket {
            Some(bucket) if !self.path_style => format!("{}://{bucket}.{host}", self.protocol),
            Some(bucket) => format!("{}://{host}/{bucket}", self.protocol),
            None => format!("{}://{host}", self.protocol),
        };
        Url::parse(&url).map_err(|e| anyhow!("invalid endpoint {url}: {e}"))
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

use crate::{
    naming::{
        DEFAULT_RANDOM_LENGTH, DuplicateHandling, NamingMode, NamingPolicy, expand_placeholders,
        file_name_from_key, split_extension,
    },
    s3::{Credentials, Protocol, Region, S3},
};
use anyhow::{Context, Result};
use chrono::Local;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use secrecy::SecretString;
use serde::Deserialize;
use std::{ops::RangeInclusive, time::Duration};

/// Lengths accepted for `random_string_length`
pub const RANDOM_LENGTH_RANGE: RangeInclusive<usize> = 4..=16;

// RFC 3986 unreserved characters stay as they are
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Extra path or query appended to the permalink of files with a given extension
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UrlSuffix {
    /// comma separated extensions, `jpg,png`
    pub file_suffix: String,
    pub url_suffix: String,
}

/// A bucket attachments are stored in
#[derive(Debug, Clone, Deserialize)]
pub struct Destination {
    /// key of the destination in the config file
    #[serde(skip)]
    pub name: String,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default = "empty_secret")]
    pub secret_key: SecretString,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub naming_mode: NamingMode,
    pub custom_template: Option<String>,
    #[serde(default)]
    pub duplicate_handling: DuplicateHandling,
    pub random_string_length: Option<usize>,
    /// public host serving the bucket, used for permalinks
    pub domain: Option<String>,
    /// seconds per store request
    pub timeout: Option<u64>,
    #[serde(default)]
    pub url_suffixes: Vec<UrlSuffix>,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new().into())
}

impl Destination {
    /// A destination without credentials, handy for tests and dry runs
    #[must_use]
    pub fn new(name: &str, bucket: &str) -> Self {
        Self {
            name: name.to_string(),
            endpoint: None,
            region: None,
            bucket: bucket.to_string(),
            access_key: String::new(),
            secret_key: empty_secret(),
            protocol: Protocol::default(),
            path_style: false,
            location: String::new(),
            naming_mode: NamingMode::default(),
            custom_template: None,
            duplicate_handling: DuplicateHandling::default(),
            random_string_length: None,
            domain: None,
            timeout: None,
            url_suffixes: Vec::new(),
        }
    }

    /// Endpoint host without scheme or trailing slash
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(strip_scheme)
            .filter(|endpoint| !endpoint.is_empty())
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(strip_scheme)
            .filter(|domain| !domain.is_empty())
    }

    /// Location prefix without leading or trailing `/`, may hold placeholders
    #[must_use]
    pub fn location(&self) -> &str {
        self.location.trim().trim_matches('/')
    }

    /// Length of generated random names, out of range values fall back to the default
    #[must_use]
    pub fn random_string_length(&self) -> usize {
        match self.random_string_length {
            Some(length) if RANDOM_LENGTH_RANGE.contains(&length) => length,
            Some(length) => {
                log::warn!(
                    "random_string_length {length} of {} not in {RANDOM_LENGTH_RANGE:?}, using {DEFAULT_RANDOM_LENGTH}",
                    self.name
                );
                DEFAULT_RANDOM_LENGTH
            }
            None => DEFAULT_RANDOM_LENGTH,
        }
    }

    /// Get the region for the destination, an endpoint makes it a custom region
    ///
    /// # Errors
    ///
    /// Will return `Err` if neither a valid region nor an endpoint is set
    pub fn region(&self) -> Result<Region> {
        if let Some(endpoint) = self.endpoint() {
            return Ok(Region::custom(self.region.as_deref(), endpoint));
        }

        let region = self
            .region
            .as_ref()
            .with_context(|| format!("destination {} needs an endpoint or region", self.name))?;

        Ok(region.parse::<Region>()?)
    }

    /// Build the signed client for the bucket
    ///
    /// # Errors
    ///
    /// Will return `Err` if the region can't be resolved
    pub fn s3(&self) -> Result<S3> {
        let credentials = Credentials::new(&self.access_key, &self.secret_key);
        let mut s3 = S3::new(
            &credentials,
            &self.region()?,
            Some(self.bucket.clone()),
            self.path_style,
        )
        .with_protocol(self.protocol);

        if let Some(seconds) = self.timeout.filter(|s| *s > 0) {
            s3 = s3.with_timeout(Duration::from_secs(seconds));
        }

        Ok(s3)
    }

    #[must_use]
    pub fn naming_policy(&self) -> NamingPolicy {
        let mut policy = NamingPolicy::new(self.naming_mode, self.duplicate_handling)
            .with_random_length(self.random_string_length());
        if let Some(template) = &self.custom_template {
            policy = policy.with_template(template);
        }
        policy
    }

    /// Location with its placeholders expanded, once per upload
    #[must_use]
    pub fn expand_location(&self) -> String {
        let location = self.location();
        if location.is_empty() {
            return String::new();
        }
        expand_placeholders(location, None, Local::now())
            .trim_matches('/')
            .to_string()
    }

    /// Object key of `file_name` under the expanded location
    #[must_use]
    pub fn object_key(&self, file_name: &str) -> String {
        join_key(&self.expand_location(), file_name)
    }

    /// Listing prefix, `location/file_prefix` with each part only when not blank
    #[must_use]
    pub fn build_prefix(&self, file_prefix: Option<&str>) -> Option<String> {
        let location = self.expand_location();
        let file_prefix = file_prefix.map(str::trim).filter(|p| !p.is_empty());

        match (location.is_empty(), file_prefix) {
            (true, None) => None,
            (true, Some(prefix)) => Some(prefix.to_string()),
            (false, None) => Some(format!("{location}/")),
            (false, Some(prefix)) => Some(format!("{location}/{prefix}")),
        }
    }

    /// Public URL of an object
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is no domain and no endpoint to build it from
    pub fn object_url(&self, key: &str) -> Result<String> {
        let path = encode_path(key);
        let base = match self.domain() {
            Some(domain) => format!("{}://{domain}", self.protocol),
            None => {
                let host = match self.endpoint() {
                    Some(endpoint) => endpoint.to_string(),
                    None => self.region()?.endpoint(),
                };
                if self.path_style {
                    format!("{}://{host}/{}", self.protocol, self.bucket)
                } else {
                    format!("{}://{}.{host}", self.protocol, self.bucket)
                }
            }
        };

        let mut url = format!("{base}/{path}");
        if let Some(suffix) = self.url_suffix(key) {
            url.push_str(suffix);
        }
        Ok(url)
    }

    /// First configured url suffix whose extensions match `file_name`, ignoring case
    #[must_use]
    pub fn url_suffix(&self, file_name: &str) -> Option<&str> {
        let (_, extension) = split_extension(file_name_from_key(file_name));
        let extension = extension?;

        self.url_suffixes
            .iter()
            .find(|suffix| {
                suffix
                    .file_suffix
                    .split(',')
                    .map(str::trim)
                    .any(|s| s.eq_ignore_ascii_case(extension))
            })
            .map(|suffix| suffix.url_suffix.as_str())
    }
}

/// `location/file_name`, or `file_name` when there is no location
#[must_use]
pub fn join_key(location: &str, file_name: &str) -> String {
    if location.is_empty() {
        file_name.to_string()
    } else {
        format!("{location}/{file_name}")
    }
}

fn strip_scheme(value: &str) -> &str {
    let value = value.trim();
    let value = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    value.trim_end_matches('/')
}

fn encode_path(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

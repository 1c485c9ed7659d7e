use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Signing region of stores that don't name one
pub const DEFAULT_REGION: &str = "us-east-1";

// af-south-1, us-gov-west-1, cn-northwest-1, ...
const AWS_REGION_PATTERN: &str = r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-\d{1,2}$";

// https://docs.aws.amazon.com/general/latest/gr/rande.html#regional-endpoints
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    /// AWS region code, lowercase
    Aws(String),

    /// S3 compatible store, endpoint without the scheme
    Custom { name: String, endpoint: String },
}

impl Region {
    /// A store reached through `endpoint`, signed for `name` or the default region
    #[must_use]
    pub fn custom(name: Option<&str>, endpoint: &str) -> Self {
        Self::Custom {
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_REGION)
                .to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Aws(name) | Self::Custom { name, .. } => name,
        }
    }

    /// Host (and optional port) of the regional endpoint
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self {
            Self::Aws(name) if name.starts_with("cn-") => format!("s3.{name}.amazonaws.com.cn"),
            Self::Aws(name) => format!("s3.{name}.amazonaws.com"),
            Self::Custom { endpoint, .. } => endpoint.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Not a valid AWS region: {0}")]
pub struct ParseRegionError(String);

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        let pattern = Regex::new(AWS_REGION_PATTERN).map_err(|_| ParseRegionError(s.into()))?;

        if pattern.is_match(&code) {
            Ok(Self::Aws(code))
        } else {
            Err(ParseRegionError(s.to_string()))
        }
    }
}

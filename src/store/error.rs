use thiserror::Error;

/// Failures of a single call against the object store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Auth(String),

    #[error("store returned HTTP {status}: {code} {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid store response: {0}")]
    Invalid(String),

    #[error("transport error: {message}{}", hint_suffix(.hint.as_deref()))]
    Transport {
        message: String,
        hint: Option<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

fn hint_suffix(hint: Option<&str>) -> String {
    hint.map(|h| format!(" ({h})")).unwrap_or_default()
}

impl StoreError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Connectivity or configuration problems, these abort a whole batch
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Config(_) | Self::Auth(_))
    }

    /// Map an HTTP status and the S3 error code into a variant
    #[must_use]
    pub fn from_status(status: u16, code: String, message: String) -> Self {
        match status {
            404 => Self::NotFound(if message.is_empty() { code } else { message }),
            401 | 403 => Self::Auth(if message.is_empty() { code } else { message }),
            _ => Self::Status {
                status,
                code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        let hint = if err.is_timeout() {
            Some("request timed out, check the endpoint and the timeout setting".to_string())
        } else if err.is_connect() {
            Some("could not connect, check the endpoint host and port".to_string())
        } else {
            None
        };

        Self::Transport {
            message: err.to_string(),
            hint,
        }
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(store_error) => store_error,
            Err(err) => match err.downcast::<reqwest::Error>() {
                Ok(reqwest_error) => Self::from(reqwest_error),
                Err(err) => Self::Invalid(format!("{err:#}")),
            },
        }
    }
}

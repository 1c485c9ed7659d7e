//! File names of uploaded objects
//!
//! A `NamingMode` turns the uploaded file name into the first candidate, a `DuplicateHandling`
//! decides how a taken name is renamed. Templates and the location prefix accept `${...}`
//! placeholders.

use chrono::{DateTime, Datelike, Local};
use rand::{Rng, distr::Alphanumeric};
use serde::Deserialize;
use std::fmt;

/// Length used by the random placeholders when none (or a non positive one) is given
pub const DEFAULT_RANDOM_LENGTH: usize = 8;

/// Length of the suffix appended when a name is already taken
pub const DUPLICATE_SUFFIX_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    /// keep the uploaded name
    #[default]
    None,
    /// expand `custom_template`
    Custom,
    Uuid,
    TimestampMs,
    DateWithString,
    DatetimeWithString,
    /// `name-random.ext`
    WithString,
    /// `random.ext`
    String,
    RandomNumber,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateHandling {
    #[default]
    RandomAlphanumeric,
    RandomAlphabetic,
    /// fail the upload instead of renaming
    Exception,
}

impl fmt::Display for DuplicateHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RandomAlphanumeric => write!(f, "random-alphanumeric"),
            Self::RandomAlphabetic => write!(f, "random-alphabetic"),
            Self::Exception => write!(f, "exception"),
        }
    }
}

/// How the upload session picks names
pub trait RenameStrategy: Send + Sync {
    /// The first candidate for an uploaded file
    fn initial_name(&self, file_name: &str) -> String;

    /// A new candidate derived from `original`, the name returned by `initial_name`.
    /// `None` refuses to rename.
    fn rename(&self, original: &str) -> Option<String>;
}

/// `RenameStrategy` built from the destination settings
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    pub mode: NamingMode,
    pub custom_template: Option<String>,
    pub random_length: usize,
    pub duplicate: DuplicateHandling,
}

impl NamingPolicy {
    #[must_use]
    pub fn new(mode: NamingMode, duplicate: DuplicateHandling) -> Self {
        Self {
            mode,
            custom_template: None,
            random_length: DEFAULT_RANDOM_LENGTH,
            duplicate,
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: &str) -> Self {
        self.custom_template = Some(template.to_string());
        self
    }

    #[must_use]
    pub const fn with_random_length(mut self, length: usize) -> Self {
        self.random_length = length;
        self
    }
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self::new(NamingMode::default(), DuplicateHandling::default())
    }
}

impl RenameStrategy for NamingPolicy {
    fn initial_name(&self, file_name: &str) -> String {
        let now = Local::now();
        let length = self.random_length;
        let (stem, extension) = split_extension(file_name);

        match self.mode {
            NamingMode::None => file_name.to_string(),
            NamingMode::Custom => match self.custom_template.as_deref() {
                Some(template) if !template.trim().is_empty() => {
                    let name = expand_placeholders(template, Some(stem), now);
                    match extension {
                        Some(ext) => format!("{name}.{ext}"),
                        None => name,
                    }
                }
                _ => file_name.to_string(),
            },
            NamingMode::Uuid => replace_name(
                file_name,
                &uuid::Uuid::new_v4().to_string().to_uppercase(),
                false,
            ),
            NamingMode::TimestampMs => {
                replace_name(file_name, &now.timestamp_millis().to_string(), false)
            }
            NamingMode::DateWithString => replace_name(
                file_name,
                &format!("{}-{}", now.format("%Y-%m-%d"), random_alphabetic(length)),
                false,
            ),
            NamingMode::DatetimeWithString => replace_name(
                file_name,
                &format!(
                    "{}-{}",
                    now.format("%Y-%m-%dT%H-%M-%S"),
                    random_alphabetic(length)
                ),
                false,
            ),
            NamingMode::WithString => replace_name(file_name, &random_alphabetic(length), true),
            NamingMode::String => replace_name(file_name, &random_alphabetic(length), false),
            NamingMode::RandomNumber => replace_name(file_name, &random_numeric(length), false),
        }
    }

    fn rename(&self, original: &str) -> Option<String> {
        match self.duplicate {
            DuplicateHandling::RandomAlphanumeric => Some(replace_name(
                original,
                &random_alphanumeric(DUPLICATE_SUFFIX_LENGTH),
                true,
            )),
            DuplicateHandling::RandomAlphabetic => Some(replace_name(
                original,
                &random_alphabetic(DUPLICATE_SUFFIX_LENGTH),
                true,
            )),
            DuplicateHandling::Exception => None,
        }
    }
}

/// Split `name.ext` on the last dot, a leading dot belongs to the extension
#[must_use]
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !ext.trim().is_empty() => (stem, Some(ext)),
        Some((stem, _)) => (stem, None),
        None => (file_name, None),
    }
}

/// Put `random` in the name, next to the original stem when `keep_name`
///
/// `halo.run` becomes `halo-xyz.run`, `.run` becomes `xyz.run` and `halo` becomes `halo-xyz`.
#[must_use]
pub fn replace_name(file_name: &str, random: &str, keep_name: bool) -> String {
    let (stem, extension) = split_extension(file_name);

    match (keep_name && !stem.trim().is_empty(), extension) {
        (true, Some(ext)) => format!("{stem}-{random}.{ext}"),
        (true, None) => format!("{stem}-{random}"),
        (false, Some(ext)) => format!("{random}.{ext}"),
        (false, None) => random.to_string(),
    }
}

/// Last path segment of an object key, the key itself when it ends with `/`
#[must_use]
pub fn file_name_from_key(key: &str) -> &str {
    match key.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name,
        _ => key,
    }
}

#[must_use]
pub fn random_alphanumeric(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect()
}

#[must_use]
pub fn random_alphabetic(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}

#[must_use]
pub fn random_numeric(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(rng.random_range(b'0'..=b'9')))
        .collect()
}

/// Expand `${placeholder}` and `${placeholder:param}` in `template`
///
/// Every time based placeholder of one call sees the same instant. Unknown placeholders and
/// an unterminated `${` are kept as written.
#[must_use]
pub fn expand_placeholders(template: &str, file_name: Option<&str>, now: DateTime<Local>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let (before, placeholder) = rest.split_at(start);
        let Some(end) = placeholder.find('}') else {
            break;
        };
        result.push_str(before);

        let inner = placeholder.get(2..end).unwrap_or_default();
        match placeholder_value(inner, file_name, now) {
            Some(value) => result.push_str(&value),
            None => {
                result.push_str("${");
                result.push_str(inner);
                result.push('}');
            }
        }
        rest = placeholder.get(end + 1..).unwrap_or_default();
    }

    result.push_str(rest);
    result
}

fn placeholder_value(inner: &str, file_name: Option<&str>, now: DateTime<Local>) -> Option<String> {
    let (name, param) = inner
        .split_once(':')
        .map_or((inner, None), |(name, param)| (name, Some(param)));

    let length = param
        .and_then(|p| p.parse::<usize>().ok())
        .filter(|length| *length > 0)
        .unwrap_or(DEFAULT_RANDOM_LENGTH);

    let value = match name {
        "origin-filename" => file_name.unwrap_or_default().to_string(),
        "uuid-with-dash" => uuid::Uuid::new_v4().to_string().to_uppercase(),
        "uuid-no-dash" => uuid::Uuid::new_v4().simple().to_string().to_uppercase(),
        "timestamp-sec" => now.timestamp().to_string(),
        "timestamp-ms" => now.timestamp_millis().to_string(),
        "year" => now.year().to_string(),
        "month" => format!("{:02}", now.month()),
        "day" => format!("{:02}", now.day()),
        "weekday" => now.weekday().number_from_monday().to_string(),
        "hour" => now.format("%H").to_string(),
        "minute" => now.format("%M").to_string(),
        "second" => now.format("%S").to_string(),
        "millisecond" => format!("{:03}", now.timestamp_subsec_millis()),
        "random-alphabetic" => random_alphabetic(length),
        "random-num" => random_numeric(length),
        "random-alphanumeric" => random_alphanumeric(length),
        _ => return None,
    };

    Some(value)
}

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A source URL extracted from free text and normalized for use as a cache
/// and dedup key. Share-card text often wraps the link in prose and stray
/// punctuation, so extraction is lenient and normalization strips what the
/// platforms ignore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"https?://[-\w.?=&/%#]+"#).expect("valid url pattern"))
}

impl NormalizedUrl {
    /// Extract the first http(s) URL from `text` and normalize it.
    pub fn parse(text: &str) -> Result<Self, UrlError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(UrlError::Empty);
        }

        let candidate = url_pattern()
            .find(trimmed)
            .ok_or_else(|| UrlError::NoUrl(trimmed.to_string()))?
            .as_str();

        let cleaned: String = candidate
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '\'' | '^' | '`'))
            .collect();

        if !cleaned.starts_with("http://") && !cleaned.starts_with("https://") {
            return Err(UrlError::UnsupportedScheme(cleaned));
        }

        Ok(Self(cleaned.trim_end_matches('/').to_string()))
    }

    pub fn from_raw(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("empty url text")]
    Empty,
    #[error("no http(s) url found in: {0}")]
    NoUrl(String),
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::Platform;

/// The platform-independent content record the pipeline produces. The
/// transcript is only populated when a transcription stage ran to
/// completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContent {
    pub platform: Platform,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub transcript: Option<String>,
    pub tags: Vec<String>,
    pub author: AuthorInfo,
    pub stats: ContentStats,
    pub media: MediaInfo,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub id: String,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub follower_count: Option<u64>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentStats {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub collects: u64,
    pub plays: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub cover_url: Option<String>,
    pub source_url: String,
    pub duration_seconds: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl NormalizedContent {
    pub fn with_transcript(mut self, transcript: String) -> Self {
        self.transcript = Some(transcript);
        self
    }
}

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#(\w+)").expect("valid hashtag pattern"))
}

/// Collect `#hashtag` tokens from a description. Used as a tag fallback
/// when the platform adapter returns none.
pub fn hashtags_from(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = hashtag_pattern()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

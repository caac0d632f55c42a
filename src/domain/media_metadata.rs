use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{hashtags_from, AuthorInfo, ContentStats, MediaInfo, NormalizedContent, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
    Image,
    Text,
}

/// What a platform adapter returns for one URL: already normalized across
/// platforms, but without any transcript and with a possibly approximate
/// duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub platform: Platform,
    pub external_id: String,
    pub media_type: MediaType,
    pub duration_seconds: Option<f64>,
    pub download_url: Option<String>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub author: AuthorInfo,
    pub stats: ContentStats,
    pub cover_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub published_at_epoch: Option<i64>,
}

impl MediaMetadata {
    /// Build the content record for this metadata, transcript left empty.
    /// Tags fall back to hashtags mined from the description when the
    /// adapter returned none.
    pub fn into_content(self, source_url: &str) -> NormalizedContent {
        let tags = if self.tags.is_empty() {
            hashtags_from(&self.description)
        } else {
            self.tags
        };

        NormalizedContent {
            platform: self.platform,
            external_id: self.external_id,
            title: self.title,
            description: self.description,
            transcript: None,
            tags,
            author: self.author,
            stats: self.stats,
            media: MediaInfo {
                cover_url: self.cover_url,
                source_url: source_url.to_string(),
                duration_seconds: self.duration_seconds,
                width: self.width,
                height: self.height,
            },
            published_at: published_at_from_epoch(self.published_at_epoch),
        }
    }
}

/// Platforms report publish times as either second- or millisecond-epoch
/// values; anything above the year-2286 second range is treated as
/// milliseconds.
pub fn published_at_from_epoch(epoch: Option<i64>) -> Option<DateTime<Utc>> {
    let value = epoch?;
    if value <= 0 {
        return None;
    }
    let seconds = if value > 10_000_000_000 {
        value / 1000
    } else {
        value
    };
    DateTime::from_timestamp(seconds, 0)
}

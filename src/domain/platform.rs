use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source platforms the service understands. Identification is by URL host
/// pattern; the actual scraping lives behind the `PlatformAdapter` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Douyin,
    Xiaohongshu,
    Bilibili,
    Kuaishou,
    Tiktok,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Bilibili => "bilibili",
            Platform::Kuaishou => "kuaishou",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    /// Identify the platform from a cleaned URL. Returns `None` for hosts
    /// no adapter covers.
    pub fn from_url(url: &str) -> Option<Self> {
        let lowered = url.to_lowercase();
        let host = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);

        const PATTERNS: &[(&str, Platform)] = &[
            ("douyin.com", Platform::Douyin),
            ("iesdouyin.com", Platform::Douyin),
            ("xiaohongshu.com", Platform::Xiaohongshu),
            ("xhslink.com", Platform::Xiaohongshu),
            ("bilibili.com", Platform::Bilibili),
            ("b23.tv", Platform::Bilibili),
            ("kuaishou.com", Platform::Kuaishou),
            ("tiktok.com", Platform::Tiktok),
            ("youtube.com", Platform::Youtube),
            ("youtu.be", Platform::Youtube),
        ];

        PATTERNS
            .iter()
            .find(|(needle, _)| host.contains(needle))
            .map(|(_, platform)| *platform)
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "douyin" => Ok(Platform::Douyin),
            "xiaohongshu" => Ok(Platform::Xiaohongshu),
            "bilibili" => Ok(Platform::Bilibili),
            "kuaishou" => Ok(Platform::Kuaishou),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use std::time::Duration;

use semporna::application::ports::ResultCache;
use semporna::domain::NormalizedUrl;
use semporna::infrastructure::cache::MemoryResultCache;

use crate::helpers::image_metadata;

fn test_url() -> NormalizedUrl {
    NormalizedUrl::parse("https://www.xiaohongshu.com/explore/n1").unwrap()
}

#[tokio::test]
async fn given_stored_entry_when_reading_within_ttl_then_returns_it() {
    let cache = MemoryResultCache::new();
    let url = test_url();
    let content = image_metadata().into_content(url.as_str());

    cache
        .put(&url, &content, Duration::from_secs(60))
        .await
        .unwrap();

    let fetched = cache.get(&url).await.unwrap().unwrap();
    assert_eq!(fetched, content);
}

#[tokio::test]
async fn given_expired_entry_when_reading_then_returns_none() {
    let cache = MemoryResultCache::new();
    let url = test_url();
    let content = image_metadata().into_content(url.as_str());

    cache
        .put(&url, &content, Duration::from_millis(20))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;

    assert!(cache.get(&url).await.unwrap().is_none());
}

#[tokio::test]
async fn given_unknown_url_when_reading_then_returns_none() {
    let cache = MemoryResultCache::new();
    assert!(cache.get(&test_url()).await.unwrap().is_none());
}

#[tokio::test]
async fn given_rewrite_when_reading_then_latest_entry_wins() {
    let cache = MemoryResultCache::new();
    let url = test_url();
    let first = image_metadata().into_content(url.as_str());
    let second = first.clone().with_transcript("now with text".to_string());

    cache
        .put(&url, &first, Duration::from_secs(60))
        .await
        .unwrap();
    cache
        .put(&url, &second, Duration::from_secs(60))
        .await
        .unwrap();

    let fetched = cache.get(&url).await.unwrap().unwrap();
    assert_eq!(fetched.transcript.as_deref(), Some("now with text"));
}

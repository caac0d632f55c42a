use semporna::domain::{hashtags_from, published_at_from_epoch};

use crate::helpers::video_metadata;

#[test]
fn given_description_with_hashtags_when_extracting_then_collects_unique_tags() {
    let tags = hashtags_from("great #travel video #food #travel day");
    assert_eq!(tags, vec!["food".to_string(), "travel".to_string()]);
}

#[test]
fn given_plain_description_when_extracting_then_finds_nothing() {
    assert!(hashtags_from("nothing tagged here").is_empty());
}

#[test]
fn given_second_epoch_when_normalizing_then_resolves_timestamp() {
    let ts = published_at_from_epoch(Some(1_700_000_000)).unwrap();
    assert_eq!(ts.timestamp(), 1_700_000_000);
}

#[test]
fn given_millisecond_epoch_when_normalizing_then_scales_to_seconds() {
    let ts = published_at_from_epoch(Some(1_700_000_000_000)).unwrap();
    assert_eq!(ts.timestamp(), 1_700_000_000);
}

#[test]
fn given_missing_or_zero_epoch_when_normalizing_then_returns_none() {
    assert!(published_at_from_epoch(None).is_none());
    assert!(published_at_from_epoch(Some(0)).is_none());
}

#[test]
fn given_metadata_without_tags_when_building_content_then_falls_back_to_hashtags() {
    let metadata = video_metadata(120.0, "https://cdn.example.com/v.mp4");
    let content = metadata.into_content("https://v.douyin.com/abc");

    assert_eq!(
        content.tags,
        vec!["film".to_string(), "short".to_string()]
    );
    assert!(content.transcript.is_none());
    assert_eq!(content.media.source_url, "https://v.douyin.com/abc");
}

#[test]
fn given_metadata_with_tags_when_building_content_then_keeps_adapter_tags() {
    let mut metadata = video_metadata(120.0, "https://cdn.example.com/v.mp4");
    metadata.tags = vec!["curated".to_string()];
    let content = metadata.into_content("https://v.douyin.com/abc");

    assert_eq!(content.tags, vec!["curated".to_string()]);
}

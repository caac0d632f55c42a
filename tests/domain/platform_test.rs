use semporna::domain::Platform;

#[test]
fn given_known_hosts_when_identifying_then_maps_to_platform() {
    let cases = [
        ("https://v.douyin.com/abc", Platform::Douyin),
        ("https://www.iesdouyin.com/share/video/1", Platform::Douyin),
        ("https://www.xiaohongshu.com/explore/n", Platform::Xiaohongshu),
        ("http://xhslink.com/a1", Platform::Xiaohongshu),
        ("https://www.bilibili.com/video/BV1", Platform::Bilibili),
        ("https://b23.tv/xyz", Platform::Bilibili),
        ("https://v.kuaishou.com/abc", Platform::Kuaishou),
        ("https://www.tiktok.com/@user/video/1", Platform::Tiktok),
        ("https://youtu.be/dQw4w9WgXcQ", Platform::Youtube),
        ("https://www.youtube.com/watch?v=1", Platform::Youtube),
    ];

    for (url, expected) in cases {
        assert_eq!(Platform::from_url(url), Some(expected), "url: {}", url);
    }
}

#[test]
fn given_unknown_host_when_identifying_then_returns_none() {
    assert_eq!(Platform::from_url("https://example.com/video/1"), None);
}

#[test]
fn given_uppercase_host_when_identifying_then_still_matches() {
    assert_eq!(
        Platform::from_url("https://WWW.BILIBILI.COM/video/BV1"),
        Some(Platform::Bilibili)
    );
}

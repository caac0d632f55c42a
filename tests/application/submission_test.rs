use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use semporna::application::ports::{JobStore, ResultCache};
use semporna::application::services::{SubmissionService, SubmitError, SubmitOutcome};
use semporna::domain::{AccountId, NormalizedUrl};
use semporna::infrastructure::cache::MemoryResultCache;
use semporna::infrastructure::persistence::MemoryJobStore;

use crate::helpers::image_metadata;

const URL: &str = "https://v.douyin.com/abc123";

struct SubmissionFixture {
    service: SubmissionService,
    cache: Arc<MemoryResultCache>,
    job_store: Arc<MemoryJobStore>,
    _receiver: mpsc::Receiver<semporna::application::services::JobMessage>,
}

fn build_submission() -> SubmissionFixture {
    let cache = Arc::new(MemoryResultCache::new());
    let job_store = Arc::new(MemoryJobStore::new());
    let (sender, receiver) = mpsc::channel(16);

    let service = SubmissionService::new(
        Arc::clone(&cache) as Arc<dyn ResultCache>,
        Arc::clone(&job_store) as Arc<dyn JobStore>,
        sender,
    );

    SubmissionFixture {
        service,
        cache,
        job_store,
        _receiver: receiver,
    }
}

#[tokio::test]
async fn given_fresh_url_when_submitting_then_creates_and_enqueues_job() {
    let fixture = build_submission();

    let outcome = fixture
        .service
        .submit(URL, true, false, AccountId::new(), "trace".to_string())
        .await
        .unwrap();

    let SubmitOutcome::Enqueued(handle) = outcome else {
        panic!("expected enqueued");
    };
    let stored = fixture
        .job_store
        .get_extraction(handle.job_id)
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn given_live_duplicate_when_submitting_then_collapses_onto_existing_job() {
    let fixture = build_submission();
    let account = AccountId::new();

    let first = fixture
        .service
        .submit(URL, true, false, account, "trace".to_string())
        .await
        .unwrap();
    // Same URL wrapped in share text still dedups onto the same job.
    let second = fixture
        .service
        .submit(
            &format!("look at this {} amazing", URL),
            true,
            false,
            account,
            "trace-2".to_string(),
        )
        .await
        .unwrap();

    let (SubmitOutcome::Enqueued(a), SubmitOutcome::Enqueued(b)) = (first, second) else {
        panic!("expected two enqueued outcomes");
    };
    assert_eq!(a.job_id, b.job_id);
}

#[tokio::test]
async fn given_cached_result_when_submitting_then_answers_inline() {
    let fixture = build_submission();
    let url = NormalizedUrl::parse(URL).unwrap();
    let content = image_metadata().into_content(url.as_str());
    fixture
        .cache
        .put(&url, &content, Duration::from_secs(60))
        .await
        .unwrap();

    let outcome = fixture
        .service
        .submit(URL, false, false, AccountId::new(), "trace".to_string())
        .await
        .unwrap();

    assert!(matches!(outcome, SubmitOutcome::CachedContent(_)));
}

#[tokio::test]
async fn given_text_without_url_when_submitting_then_rejects() {
    let fixture = build_submission();

    let err = fixture
        .service
        .submit(
            "just words",
            false,
            false,
            AccountId::new(),
            "trace".to_string(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::InvalidUrl(_)));
}

#[tokio::test]
async fn given_unsupported_host_when_submitting_then_rejects() {
    let fixture = build_submission();

    let err = fixture
        .service
        .submit(
            "https://example.com/clip",
            false,
            false,
            AccountId::new(),
            "trace".to_string(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::UnsupportedPlatform(_)));
}

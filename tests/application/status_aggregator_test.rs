use std::sync::Arc;

use semporna::application::ports::{JobStore, Ledger};
use semporna::application::services::{ClientStatus, StatusAggregator};
use semporna::domain::{
    AccountId, ExtractionJob, ExtractionRequest, JobId, NormalizedUrl, QueueState,
    StageOneResult, StageTwoResult, StoragePath, TranscriptionJob, TranscriptionJobSpec,
};
use semporna::infrastructure::ledger::MemoryLedger;
use semporna::infrastructure::persistence::MemoryJobStore;

use crate::helpers::video_metadata;

const URL: &str = "https://v.douyin.com/abc123";

struct AggregatorFixture {
    aggregator: StatusAggregator,
    job_store: Arc<MemoryJobStore>,
    ledger: Arc<MemoryLedger>,
}

fn build_aggregator() -> AggregatorFixture {
    let job_store = Arc::new(MemoryJobStore::new());
    let ledger = Arc::new(MemoryLedger::new());
    let aggregator = StatusAggregator::new(
        Arc::clone(&job_store) as Arc<dyn JobStore>,
        Arc::clone(&ledger) as Arc<dyn Ledger>,
    );
    AggregatorFixture {
        aggregator,
        job_store,
        ledger,
    }
}

fn extraction_job(account: AccountId) -> ExtractionJob {
    ExtractionJob::new(
        ExtractionRequest {
            source_url: URL.to_string(),
            want_transcript: true,
            want_comments: false,
            account_id: account,
            trace_id: "trace-1".to_string(),
        },
        NormalizedUrl::parse(URL).unwrap(),
    )
}

fn transcription_job(account: AccountId) -> TranscriptionJob {
    TranscriptionJob::new(TranscriptionJobSpec {
        audio_path: StoragePath::from_raw("job/clip.mp4"),
        metadata: video_metadata(125.0, "https://cdn.example.com/v.mp4").into_content(URL),
        normalized_url: NormalizedUrl::parse(URL).unwrap(),
        account_id: account,
        trace_id: "trace-1".to_string(),
    })
}

async fn seed_extraction(
    fixture: &AggregatorFixture,
    job: &ExtractionJob,
    state: QueueState,
    result: Option<StageOneResult>,
    error: Option<&str>,
) {
    fixture.job_store.create_extraction(job).await.unwrap();
    if let Some(result) = result {
        fixture
            .job_store
            .record_stage_one(job.id, &result)
            .await
            .unwrap();
    }
    fixture
        .job_store
        .set_extraction_state(job.id, state, error)
        .await
        .unwrap();
}

async fn seed_transcription(
    fixture: &AggregatorFixture,
    job: &TranscriptionJob,
    state: QueueState,
    result: Option<StageTwoResult>,
    error: Option<&str>,
) {
    fixture.job_store.create_transcription(job).await.unwrap();
    if let Some(result) = result {
        fixture
            .job_store
            .record_stage_two(job.id, &result)
            .await
            .unwrap();
    }
    fixture
        .job_store
        .set_transcription_state(job.id, state, error)
        .await
        .unwrap();
}

#[tokio::test]
async fn given_unknown_job_when_resolving_then_returns_none() {
    let fixture = build_aggregator();
    assert!(fixture
        .aggregator
        .resolve(JobId::new())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn given_queued_or_running_job_when_resolving_then_reports_running() {
    let fixture = build_aggregator();
    let job = extraction_job(AccountId::new());
    seed_extraction(&fixture, &job, QueueState::Queued, None, None).await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Running);
    assert_eq!(report.consumed_credits, 0);
    assert!(report.data.is_none());
}

#[tokio::test]
async fn given_queue_level_failure_when_resolving_then_reports_failed_with_reason() {
    let fixture = build_aggregator();
    let job = extraction_job(AccountId::new());
    seed_extraction(
        &fixture,
        &job,
        QueueState::Failed,
        None,
        Some("job exceeded hard time limit"),
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
    assert_eq!(
        report.error.as_deref(),
        Some("job exceeded hard time limit")
    );
    assert_eq!(report.consumed_credits, 0);
}

#[tokio::test]
async fn given_stage_one_success_when_resolving_then_completed_and_base_settled_once() {
    let fixture = build_aggregator();
    let account = AccountId::new();
    fixture.ledger.credit(account, 100).await;

    let job = extraction_job(account);
    let content = video_metadata(0.0, "").into_content(URL);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Success { content }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Completed);
    assert_eq!(report.consumed_credits, 10);
    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 90);

    // Repeated polling is idempotent: no second charge.
    fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 90);
}

#[tokio::test]
async fn given_stage_one_failed_result_when_resolving_then_nothing_is_charged() {
    let fixture = build_aggregator();
    let account = AccountId::new();
    fixture.ledger.credit(account, 100).await;

    let job = extraction_job(account);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Failed {
            reason: "platform fetch timed out: upstream".to_string(),
        }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
    assert!(report.error.unwrap().contains("timed out"));
    assert_eq!(report.consumed_credits, 0);
    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 100);
}

#[tokio::test]
async fn given_pending_with_unresolved_stage_two_then_stays_transcribing() {
    let fixture = build_aggregator();
    let account = AccountId::new();

    let stage_two = transcription_job(account);
    seed_transcription(&fixture, &stage_two, QueueState::Queued, None, None).await;

    let job = extraction_job(account);
    let partial = video_metadata(125.0, "").into_content(URL);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Pending {
            stage_two: stage_two.handle(),
            partial_metadata: partial,
            base_cost: 10,
        }),
        None,
    )
    .await;

    // Never completed, never failed, for as long as stage-2 is unresolved.
    for _ in 0..3 {
        let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
        assert_eq!(report.status, ClientStatus::Transcribing);
        assert!(report.data.is_none());
    }

    fixture
        .job_store
        .set_transcription_state(stage_two.id, QueueState::Running, None)
        .await
        .unwrap();
    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Transcribing);
}

#[tokio::test]
async fn given_stage_two_success_when_resolving_then_total_cost_is_base_plus_realized() {
    let fixture = build_aggregator();
    let account = AccountId::new();
    fixture.ledger.credit(account, 100).await;

    let stage_two = transcription_job(account);
    let content = video_metadata(125.0, "")
        .into_content(URL)
        .with_transcript("spoken words".to_string());
    seed_transcription(
        &fixture,
        &stage_two,
        QueueState::Completed,
        Some(StageTwoResult::Success {
            content,
            realized_cost: 20,
        }),
        None,
    )
    .await;

    let job = extraction_job(account);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Pending {
            stage_two: stage_two.handle(),
            partial_metadata: video_metadata(125.0, "").into_content(URL),
            base_cost: 10,
        }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Completed);
    assert_eq!(report.consumed_credits, 30);
    assert_eq!(
        report.data.unwrap().transcript.as_deref(),
        Some("spoken words")
    );

    // Only the base cost settles here; the realized share was committed by
    // the transcription stage itself.
    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 90);

    fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 90);
}

#[tokio::test]
async fn given_stage_two_failure_when_resolving_then_partial_metadata_and_base_cost_only() {
    let fixture = build_aggregator();
    let account = AccountId::new();
    fixture.ledger.credit(account, 100).await;

    let stage_two = transcription_job(account);
    seed_transcription(
        &fixture,
        &stage_two,
        QueueState::Completed,
        Some(StageTwoResult::Failed {
            reason: "all 4 chunks failed to transcribe".to_string(),
        }),
        None,
    )
    .await;

    let job = extraction_job(account);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Pending {
            stage_two: stage_two.handle(),
            partial_metadata: video_metadata(125.0, "").into_content(URL),
            base_cost: 10,
        }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
    assert_eq!(report.consumed_credits, 10);
    let partial = report.data.expect("partial metadata is surfaced");
    assert!(partial.transcript.is_none());
    assert!(report.error.unwrap().contains("chunks failed"));

    assert_eq!(fixture.ledger.check_balance(account).await.unwrap(), 90);
}

#[tokio::test]
async fn given_stage_two_queue_failure_when_resolving_then_failed_with_base_cost() {
    let fixture = build_aggregator();
    let account = AccountId::new();
    fixture.ledger.credit(account, 100).await;

    let stage_two = transcription_job(account);
    seed_transcription(
        &fixture,
        &stage_two,
        QueueState::Failed,
        None,
        Some("job exceeded hard time limit"),
    )
    .await;

    let job = extraction_job(account);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Pending {
            stage_two: stage_two.handle(),
            partial_metadata: video_metadata(125.0, "").into_content(URL),
            base_cost: 10,
        }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
    assert_eq!(report.consumed_credits, 10);
    assert!(report.data.is_some());
}

#[tokio::test]
async fn given_completed_job_without_result_when_resolving_then_generic_failure() {
    let fixture = build_aggregator();
    let job = extraction_job(AccountId::new());
    seed_extraction(&fixture, &job, QueueState::Completed, None, None).await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
    assert!(report.error.unwrap().contains("internal error"));
}

#[tokio::test]
async fn given_dangling_stage_two_handle_when_resolving_then_generic_failure_not_completed() {
    let fixture = build_aggregator();
    let account = AccountId::new();

    let job = extraction_job(account);
    seed_extraction(
        &fixture,
        &job,
        QueueState::Completed,
        Some(StageOneResult::Pending {
            stage_two: transcription_job(account).handle(),
            partial_metadata: video_metadata(125.0, "").into_content(URL),
            base_cost: 10,
        }),
        None,
    )
    .await;

    let report = fixture.aggregator.resolve(job.id).await.unwrap().unwrap();
    assert_eq!(report.status, ClientStatus::Failed);
}

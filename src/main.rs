use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use semporna::application::ports::{
    AudioSlicer, JobStore, Ledger, MediaDownloader, MediaStore, ModelKey, PlatformAdapter,
    ResultCache, TranscriptionDispatcher,
};
use semporna::application::services::{
    AdmissionController, ExtractionStage, ExtractionWorker, ModelRegistry, StatusAggregator,
    SubmissionService, TranscriptionEngine, TranscriptionStage, TranscriptionWorker,
};
use semporna::infrastructure::audio::{CandleModelLoader, WavSlicer};
use semporna::infrastructure::cache::MemoryResultCache;
use semporna::infrastructure::download::HttpMediaDownloader;
use semporna::infrastructure::ledger::{MemoryLedger, PgLedger};
use semporna::infrastructure::observability::{init_tracing, TracingConfig};
use semporna::infrastructure::persistence::{create_pool, MemoryJobStore, PgJobStore};
use semporna::infrastructure::platforms::ScriptedPlatformAdapter;
use semporna::infrastructure::queue::QueueDispatcher;
use semporna::infrastructure::storage::LocalMediaStore;
use semporna::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    init_tracing(TracingConfig::default(), settings.server.port);

    let media_store: Arc<dyn MediaStore> =
        Arc::new(LocalMediaStore::new(settings.storage.media_dir.clone())?);
    let cache: Arc<dyn ResultCache> = Arc::new(MemoryResultCache::new());

    let (job_store, ledger): (Arc<dyn JobStore>, Arc<dyn Ledger>) = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(url, settings.database.max_connections).await?;
            (
                Arc::new(PgJobStore::new(pool.clone())) as Arc<dyn JobStore>,
                Arc::new(PgLedger::new(pool)) as Arc<dyn Ledger>,
            )
        }
        None => (
            Arc::new(MemoryJobStore::new()) as Arc<dyn JobStore>,
            Arc::new(MemoryLedger::new()) as Arc<dyn Ledger>,
        ),
    };

    let admission = Arc::new(AdmissionController::new(Arc::clone(&ledger)));

    // The real platform scrapers live outside this service; the scripted
    // adapter stands in for them here.
    let adapter: Arc<dyn PlatformAdapter> = Arc::new(ScriptedPlatformAdapter::new());
    let downloader: Arc<dyn MediaDownloader> =
        Arc::new(HttpMediaDownloader::new(Arc::clone(&media_store))?);

    let registry = Arc::new(ModelRegistry::new(Box::new(CandleModelLoader)));
    let slicer: Arc<dyn AudioSlicer> = Arc::new(WavSlicer::new());
    let model_key = ModelKey {
        size: settings.transcription.model_size,
        device: settings.transcription.device,
        precision: settings.transcription.precision,
    };
    let engine = Arc::new(TranscriptionEngine::new(
        Arc::clone(&registry),
        slicer,
        model_key,
        settings.transcription.max_parallel_chunks,
        std::env::temp_dir().join("semporna"),
    ));

    let (extraction_tx, extraction_rx) = mpsc::channel(settings.queue.capacity);
    let (transcription_tx, transcription_rx) = mpsc::channel(settings.queue.capacity);

    let dispatcher: Arc<dyn TranscriptionDispatcher> = Arc::new(QueueDispatcher::new(
        Arc::clone(&job_store),
        transcription_tx,
    ));

    let cache_ttl = Duration::from_secs(settings.cache.ttl_seconds);
    let soft_timeout = Duration::from_secs(settings.queue.soft_timeout_seconds);
    let hard_timeout = Duration::from_secs(settings.queue.hard_timeout_seconds);

    let extraction_stage = Arc::new(ExtractionStage::new(
        adapter,
        Arc::clone(&cache),
        Arc::clone(&admission),
        downloader,
        dispatcher,
        cache_ttl,
    ));
    let transcription_stage = Arc::new(TranscriptionStage::new(
        Arc::clone(&cache),
        admission,
        Arc::clone(&ledger),
        Arc::clone(&media_store),
        engine,
        cache_ttl,
    ));

    tokio::spawn(
        ExtractionWorker::new(
            extraction_rx,
            Arc::clone(&job_store),
            extraction_stage,
            soft_timeout,
            hard_timeout,
        )
        .run(),
    );
    tokio::spawn(
        TranscriptionWorker::new(
            transcription_rx,
            Arc::clone(&job_store),
            transcription_stage,
            soft_timeout,
            hard_timeout,
        )
        .run(),
    );

    let submission = Arc::new(SubmissionService::new(
        cache,
        Arc::clone(&job_store),
        extraction_tx,
    ));
    let aggregator = Arc::new(StatusAggregator::new(job_store, ledger));

    let state = AppState {
        submission,
        aggregator,
    };
    let router = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    registry.shutdown().await;

    Ok(())
}

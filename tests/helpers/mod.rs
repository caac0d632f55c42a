use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::sync::mpsc;

use semporna::application::ports::{
    AudioError, AudioProbe, AudioSlicer, ChunkSpan, DeviceKind, DownloadError, ExportedChunk,
    JobStore, Ledger, MediaDownloader, MediaStore, ModelError, ModelKey, ModelSize,
    PlatformAdapter, Precision, ResultCache, SpeechModel, SpeechModelLoader,
    TranscriptionDispatcher,
};
use semporna::application::services::{
    AdmissionController, ExtractionStage, ExtractionWorker, ModelRegistry, StatusAggregator,
    SubmissionService, TranscriptionEngine, TranscriptionStage, TranscriptionWorker,
};
use semporna::domain::{
    AuthorInfo, ContentStats, MediaMetadata, MediaType, Platform, StoragePath,
};
use semporna::infrastructure::cache::MemoryResultCache;
use semporna::infrastructure::ledger::MemoryLedger;
use semporna::infrastructure::persistence::MemoryJobStore;
use semporna::infrastructure::platforms::ScriptedPlatformAdapter;
use semporna::infrastructure::queue::QueueDispatcher;
use semporna::infrastructure::storage::LocalMediaStore;
use semporna::presentation::{create_router, AppState};

pub const CACHE_TTL: Duration = Duration::from_secs(600);

pub fn test_author() -> AuthorInfo {
    AuthorInfo {
        id: "author-1".to_string(),
        nickname: "creator".to_string(),
        avatar_url: None,
        follower_count: Some(1200),
        region: None,
    }
}

pub fn video_metadata(duration_seconds: f64, download_url: &str) -> MediaMetadata {
    MediaMetadata {
        platform: Platform::Douyin,
        external_id: "vid-1".to_string(),
        media_type: MediaType::Video,
        duration_seconds: Some(duration_seconds),
        download_url: Some(download_url.to_string()),
        title: "a short film".to_string(),
        description: "watch this #film #short".to_string(),
        tags: vec![],
        author: test_author(),
        stats: ContentStats {
            likes: 10,
            comments: 2,
            shares: 1,
            collects: 0,
            plays: 99,
        },
        cover_url: None,
        width: Some(1080),
        height: Some(1920),
        published_at_epoch: Some(1_700_000_000),
    }
}

pub fn image_metadata() -> MediaMetadata {
    MediaMetadata {
        media_type: MediaType::Image,
        duration_seconds: None,
        download_url: None,
        ..video_metadata(0.0, "")
    }
}

/// Scripted per-chunk model behavior, keyed by the chunk index parsed from
/// the exported file name. Paths that are not chunk files get the default
/// text.
#[derive(Clone)]
pub enum ChunkBehavior {
    Text(String),
    DelayThenText(Duration, String),
    Fail,
}

pub struct ScriptedModel {
    default_text: String,
    behaviors: Mutex<HashMap<usize, ChunkBehavior>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(default_text: &str) -> Self {
        Self {
            default_text: default_text.to_string(),
            behaviors: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn script_chunk(&self, index: usize, behavior: ChunkBehavior) {
        self.behaviors.lock().unwrap().insert(index, behavior);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn chunk_index_of(path: &Path) -> Option<usize> {
    path.file_stem()?
        .to_str()?
        .strip_prefix("chunk_")?
        .parse()
        .ok()
}

#[async_trait]
impl SpeechModel for ScriptedModel {
    async fn transcribe(&self, audio: &Path) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let behavior = chunk_index_of(audio)
            .and_then(|i| self.behaviors.lock().unwrap().get(&i).cloned());

        match behavior {
            None => Ok(self.default_text.clone()),
            Some(ChunkBehavior::Text(text)) => Ok(text),
            Some(ChunkBehavior::DelayThenText(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(ChunkBehavior::Fail) => {
                Err(ModelError::TranscriptionFailed("scripted failure".to_string()))
            }
        }
    }
}

/// Loader handing out one shared scripted model, counting loads and
/// optionally refusing GPU keys with an out-of-memory error.
pub struct FakeLoader {
    model: Arc<ScriptedModel>,
    loads: Arc<AtomicUsize>,
    oom_on_cuda: bool,
}

impl FakeLoader {
    pub fn new(model: Arc<ScriptedModel>) -> (Self, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                model,
                loads: Arc::clone(&loads),
                oom_on_cuda: false,
            },
            loads,
        )
    }

    pub fn oom_on_cuda(mut self) -> Self {
        self.oom_on_cuda = true;
        self
    }
}

impl SpeechModelLoader for FakeLoader {
    fn load(&self, key: &ModelKey) -> Result<Arc<dyn SpeechModel>, ModelError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.oom_on_cuda && key.device == DeviceKind::Cuda {
            return Err(ModelError::OutOfMemory("CUDA out of memory".to_string()));
        }
        Ok(Arc::clone(&self.model) as Arc<dyn SpeechModel>)
    }
}

/// Slicer that fakes probing and writes placeholder chunk files, so engine
/// and stage tests run without real audio.
pub struct FakeSlicer {
    duration_seconds: f64,
}

impl FakeSlicer {
    pub fn new(duration_seconds: f64) -> Self {
        Self { duration_seconds }
    }
}

#[async_trait]
impl AudioSlicer for FakeSlicer {
    async fn probe(&self, _audio: &Path) -> Result<AudioProbe, AudioError> {
        Ok(AudioProbe {
            duration_seconds: self.duration_seconds,
            sample_rate: 16_000,
        })
    }

    async fn export_slices(
        &self,
        _audio: &Path,
        spans: &[ChunkSpan],
        dest_dir: &Path,
    ) -> Result<Vec<ExportedChunk>, AudioError> {
        let mut exported = Vec::new();
        for span in spans {
            let duration = span.end - span.start;
            if duration < 0.1 {
                continue;
            }
            let path = dest_dir.join(format!("chunk_{}.wav", span.index));
            tokio::fs::write(&path, b"fake audio").await?;
            exported.push(ExportedChunk {
                index: span.index,
                path,
                duration_seconds: duration,
            });
        }
        Ok(exported)
    }
}

pub struct CountingDownloader {
    calls: AtomicUsize,
}

impl CountingDownloader {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDownloader for CountingDownloader {
    async fn download(&self, _url: &str, _dest: &StoragePath) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(4)
    }
}

pub fn test_model_key() -> ModelKey {
    ModelKey {
        size: ModelSize::Small,
        device: DeviceKind::Cpu,
        precision: Precision::F32,
    }
}

/// Everything a full-pipeline test needs, wired like `main` but with
/// in-memory adapters and scripted audio.
pub struct Harness {
    pub router: Router,
    pub adapter: Arc<ScriptedPlatformAdapter>,
    pub ledger: Arc<MemoryLedger>,
    pub job_store: Arc<MemoryJobStore>,
    pub cache: Arc<MemoryResultCache>,
    pub downloader: Arc<CountingDownloader>,
    pub model: Arc<ScriptedModel>,
    _work_dir: tempfile::TempDir,
}

pub async fn build_harness(probe_duration: f64) -> Harness {
    let work_dir = tempfile::TempDir::new().unwrap();

    let adapter = Arc::new(ScriptedPlatformAdapter::new());
    let ledger = Arc::new(MemoryLedger::new());
    let job_store = Arc::new(MemoryJobStore::new());
    let cache = Arc::new(MemoryResultCache::new());
    let downloader = Arc::new(CountingDownloader::new());
    let media_store: Arc<dyn MediaStore> =
        Arc::new(LocalMediaStore::new(work_dir.path().join("media")).unwrap());

    let model = Arc::new(ScriptedModel::new("transcribed text"));
    let (loader, _) = FakeLoader::new(Arc::clone(&model));
    let registry = Arc::new(ModelRegistry::new(Box::new(loader)));
    let slicer: Arc<dyn AudioSlicer> = Arc::new(FakeSlicer::new(probe_duration));
    let engine = Arc::new(TranscriptionEngine::new(
        registry,
        slicer,
        test_model_key(),
        4,
        work_dir.path().join("chunks"),
    ));

    let admission = Arc::new(AdmissionController::new(
        Arc::clone(&ledger) as Arc<dyn Ledger>
    ));

    let (extraction_tx, extraction_rx) = mpsc::channel(16);
    let (transcription_tx, transcription_rx) = mpsc::channel(16);

    let dispatcher: Arc<dyn TranscriptionDispatcher> = Arc::new(QueueDispatcher::new(
        Arc::clone(&job_store) as Arc<dyn JobStore>,
        transcription_tx,
    ));

    let extraction_stage = Arc::new(ExtractionStage::new(
        Arc::clone(&adapter) as Arc<dyn PlatformAdapter>,
        Arc::clone(&cache) as Arc<dyn ResultCache>,
        Arc::clone(&admission),
        Arc::clone(&downloader) as Arc<dyn MediaDownloader>,
        dispatcher,
        CACHE_TTL,
    ));
    let transcription_stage = Arc::new(TranscriptionStage::new(
        Arc::clone(&cache) as Arc<dyn ResultCache>,
        admission,
        Arc::clone(&ledger) as Arc<dyn Ledger>,
        Arc::clone(&media_store),
        engine,
        CACHE_TTL,
    ));

    tokio::spawn(
        ExtractionWorker::new(
            extraction_rx,
            Arc::clone(&job_store) as Arc<dyn JobStore>,
            extraction_stage,
            Duration::from_secs(240),
            Duration::from_secs(300),
        )
        .run(),
    );
    tokio::spawn(
        TranscriptionWorker::new(
            transcription_rx,
            Arc::clone(&job_store) as Arc<dyn JobStore>,
            transcription_stage,
            Duration::from_secs(240),
            Duration::from_secs(300),
        )
        .run(),
    );

    let submission = Arc::new(SubmissionService::new(
        Arc::clone(&cache) as Arc<dyn ResultCache>,
        Arc::clone(&job_store) as Arc<dyn JobStore>,
        extraction_tx,
    ));
    let aggregator = Arc::new(StatusAggregator::new(
        Arc::clone(&job_store) as Arc<dyn JobStore>,
        Arc::clone(&ledger) as Arc<dyn Ledger>,
    ));

    let router = create_router(AppState {
        submission,
        aggregator,
    });

    Harness {
        router,
        adapter,
        ledger,
        job_store,
        cache,
        downloader,
        model,
        _work_dir: work_dir,
    }
}

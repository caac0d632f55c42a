use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    MediaDownloader, PlatformAdapter, ResultCache, TranscriptionDispatcher,
};
use crate::application::services::AdmissionController;
use crate::domain::{
    estimate_cost, ExtractionJob, MediaType, NormalizedContent, NormalizedUrl, StageOneResult,
    StoragePath, TranscriptionJobSpec, BASE_COST,
};

/// Stage-1: cache lookup, metadata fetch, admission pre-check, media
/// download, transcription dispatch. Safe to re-execute under at-least-once
/// redelivery: the cache check at the top prevents a second dispatch once a
/// prior attempt finished the work.
pub struct ExtractionStage {
    adapter: Arc<dyn PlatformAdapter>,
    cache: Arc<dyn ResultCache>,
    admission: Arc<AdmissionController>,
    downloader: Arc<dyn MediaDownloader>,
    dispatcher: Arc<dyn TranscriptionDispatcher>,
    cache_ttl: Duration,
}

impl ExtractionStage {
    pub fn new(
        adapter: Arc<dyn PlatformAdapter>,
        cache: Arc<dyn ResultCache>,
        admission: Arc<AdmissionController>,
        downloader: Arc<dyn MediaDownloader>,
        dispatcher: Arc<dyn TranscriptionDispatcher>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            adapter,
            cache,
            admission,
            downloader,
            dispatcher,
            cache_ttl,
        }
    }

    pub async fn run(&self, job: &ExtractionJob) -> StageOneResult {
        match self.execute(job).await {
            Ok(result) => result,
            Err(reason) => {
                tracing::warn!(job_id = %job.id, reason = %reason, "Extraction stage failed");
                StageOneResult::Failed { reason }
            }
        }
    }

    async fn execute(&self, job: &ExtractionJob) -> Result<StageOneResult, String> {
        let url = &job.normalized_url;

        match self.cache.get(url).await {
            Ok(Some(content)) => {
                tracing::info!(job_id = %job.id, url = %url, "Result cache hit");
                return Ok(StageOneResult::Success { content });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Result cache read failed, doing the real work");
            }
        }

        let metadata = self
            .adapter
            .fetch(url, job.request.want_comments)
            .await
            .map_err(|e| e.to_string())?;

        let media_type = metadata.media_type;
        let reported_duration = metadata.duration_seconds;
        let download_url = metadata.download_url.clone();
        let content = metadata.into_content(url.as_str());

        if !job.request.want_transcript || media_type != MediaType::Video {
            self.write_cache(url, &content).await;
            return Ok(StageOneResult::Success { content });
        }

        // Pre-flight against the adapter's (possibly approximate) duration,
        // before anything is downloaded.
        let required = estimate_cost(reported_duration.unwrap_or(0.0));
        self.admission
            .require(job.request.account_id, required)
            .await
            .map_err(|e| e.to_string())?;

        let download_url = download_url.ok_or_else(|| {
            format!("no downloadable media stream for url: {}", url)
        })?;

        let audio_path = StoragePath::for_job(&job.id, &filename_from_url(&download_url));
        let bytes = self
            .downloader
            .download(&download_url, &audio_path)
            .await
            .map_err(|e| e.to_string())?;
        tracing::info!(job_id = %job.id, bytes, path = %audio_path, "Media downloaded");

        let spec = TranscriptionJobSpec {
            audio_path,
            metadata: content.clone(),
            normalized_url: url.clone(),
            account_id: job.request.account_id,
            trace_id: job.request.trace_id.clone(),
        };
        let stage_two = self
            .dispatcher
            .dispatch(spec)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(
            job_id = %job.id,
            stage_two = %stage_two.job_id,
            "Transcription job dispatched"
        );

        Ok(StageOneResult::Pending {
            stage_two,
            partial_metadata: content,
            base_cost: BASE_COST,
        })
    }

    async fn write_cache(&self, url: &NormalizedUrl, content: &NormalizedContent) {
        if let Err(e) = self.cache.put(url, content, self.cache_ttl).await {
            tracing::warn!(error = %e, url = %url, "Result cache write failed");
        }
    }
}

fn filename_from_url(url: &str) -> String {
    url.split('?')
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && name.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "media.bin".to_string())
}

mod audio_slicer;
mod dispatcher;
mod job_store;
mod ledger;
mod media_downloader;
mod media_store;
mod platform_adapter;
mod result_cache;
mod speech_model;

pub use audio_slicer::{AudioError, AudioProbe, AudioSlicer, ChunkSpan, ExportedChunk};
pub use dispatcher::{DispatchError, TranscriptionDispatcher};
pub use job_store::{JobStore, JobStoreError};
pub use ledger::{ChargeReceipt, Ledger, LedgerError};
pub use media_downloader::{DownloadError, MediaDownloader};
pub use media_store::{MediaStore, MediaStoreError};
pub use platform_adapter::{PlatformAdapter, PlatformError};
pub use result_cache::{CacheError, ResultCache};
pub use speech_model::{
    DeviceKind, ModelError, ModelKey, ModelSize, Precision, SpeechModel, SpeechModelLoader,
};

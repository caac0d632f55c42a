mod admission;
mod extraction_stage;
mod job_budget;
mod model_registry;
mod status_aggregator;
mod submission;
mod transcription_engine;
mod transcription_stage;
mod workers;

pub use admission::{Admission, AdmissionController, AdmissionError};
pub use extraction_stage::ExtractionStage;
pub use job_budget::JobBudget;
pub use model_registry::ModelRegistry;
pub use status_aggregator::{ClientStatus, StatusAggregator, StatusReport};
pub use submission::{SubmissionService, SubmitError, SubmitOutcome};
pub use transcription_engine::{plan_chunks, ChunkPlan, EngineError, TranscriptionEngine};
pub use transcription_stage::TranscriptionStage;
pub use workers::{ExtractionWorker, JobMessage, TranscriptionWorker};

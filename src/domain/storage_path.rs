use std::fmt;

use serde::{Deserialize, Serialize};

use super::JobId;

/// Location of a downloaded media file inside the storage namespace shared
/// by the extraction writer and the transcription reader. Relative to the
/// store's base prefix; both stages resolve it through the same store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn for_job(job_id: &JobId, filename: &str) -> Self {
        Self(format!("{}/{}", job_id.as_uuid(), filename))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

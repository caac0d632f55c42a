use std::path::PathBuf;

use serde::Deserialize;

use crate::application::ports::{DeviceKind, ModelSize, Precision};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub queue: QueueSettings,
    pub transcription: TranscriptionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub media_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    pub capacity: usize,
    pub soft_timeout_seconds: u64,
    pub hard_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionSettings {
    pub model_size: ModelSize,
    pub device: DeviceKind,
    pub precision: Precision,
    pub max_parallel_chunks: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Environment-variable configuration with workable local defaults,
    /// mirroring how the service is deployed.
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: env_parsed("SERVER_PORT", 3000),
            },
            database: DatabaseSettings {
                url: std::env::var("DATABASE_URL").ok(),
                max_connections: env_parsed("DATABASE_MAX_CONNECTIONS", 5),
            },
            storage: StorageSettings {
                media_dir: PathBuf::from(env_or("MEDIA_DIR", "/tmp/semporna/media")),
            },
            cache: CacheSettings {
                ttl_seconds: env_parsed("RESULT_CACHE_TTL_SECONDS", 600),
            },
            queue: QueueSettings {
                capacity: env_parsed("QUEUE_CAPACITY", 64),
                soft_timeout_seconds: env_parsed("JOB_SOFT_TIMEOUT_SECONDS", 240),
                hard_timeout_seconds: env_parsed("JOB_HARD_TIMEOUT_SECONDS", 300),
            },
            transcription: TranscriptionSettings {
                model_size: parse_model_size(&env_or("WHISPER_MODEL_SIZE", "small")),
                device: if env_or("WHISPER_DEVICE", "cpu") == "cuda" {
                    DeviceKind::Cuda
                } else {
                    DeviceKind::Cpu
                },
                precision: if env_or("WHISPER_PRECISION", "f32") == "f16" {
                    Precision::F16
                } else {
                    Precision::F32
                },
                max_parallel_chunks: env_parsed("MAX_PARALLEL_CHUNKS", 4),
            },
            logging: LoggingSettings {
                level: env_or("LOG_LEVEL", "info"),
                enable_json: env_or("LOG_FORMAT", "text") == "json",
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_model_size(value: &str) -> ModelSize {
    match value {
        "tiny" => ModelSize::Tiny,
        "base" => ModelSize::Base,
        "medium" => ModelSize::Medium,
        _ => ModelSize::Small,
    }
}

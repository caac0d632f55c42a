mod settings;

pub use settings::{
    CacheSettings, DatabaseSettings, LoggingSettings, QueueSettings, ServerSettings, Settings,
    StorageSettings, TranscriptionSettings,
};

pub mod audio;
pub mod cache;
pub mod download;
pub mod ledger;
pub mod observability;
pub mod persistence;
pub mod platforms;
pub mod queue;
pub mod storage;

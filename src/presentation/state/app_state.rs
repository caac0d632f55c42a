use std::sync::Arc;

use crate::application::services::{StatusAggregator, SubmissionService};

#[derive(Clone)]
pub struct AppState {
    pub submission: Arc<SubmissionService>,
    pub aggregator: Arc<StatusAggregator>,
}

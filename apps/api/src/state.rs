use std::sync::Arc;

use crate::config::Config;
use crate::contracts::ContractLifecycle;
use crate::jobs::JobStore;
use crate::llm_client::LlmClient;
use crate::matching::MatchingDelegate;
use crate::storage::SnapshotStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub contracts: Arc<ContractLifecycle>,
    /// Same store the lifecycle writes to; exposed for snapshot lookups.
    pub snapshots: Arc<dyn SnapshotStore>,
    pub jobs: Arc<dyn JobStore>,
    /// Pluggable matcher. Default: LlmMatchingDelegate.
    pub matcher: Arc<dyn MatchingDelegate>,
    pub llm: LlmClient,
    pub config: Config,
}

use std::sync::Arc;

use stepsight_core::capabilities::Capabilities;
use stepsight_core::submission::SubmissionStore;

use crate::config::ServerConfig;

/// Shared application state available to all axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is `Copy`).
#[derive(Clone)]
pub struct AppState {
    /// The process-lifetime submission store.
    pub store: Arc<SubmissionStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Optional-capability flags resolved at startup.
    pub capabilities: Capabilities,
}

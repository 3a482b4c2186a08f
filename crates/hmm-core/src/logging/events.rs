//! Structured event names and the run context attached to fit events.

use serde::{Deserialize, Serialize};

/// Standard event names used in logging.
pub mod event_names {
    // EM driver lifecycle
    pub const FIT_STARTED: &str = "fit.started";
    pub const FIT_ITERATION: &str = "fit.iteration";
    pub const FIT_CONVERGED: &str = "fit.converged";
    pub const FIT_REGRESSION: &str = "fit.regression";

    // Numerical edge cases
    pub const ZERO_LIKELIHOOD: &str = "inference.zero_likelihood";
    pub const UNREACHED_STATE: &str = "reestimate.unreached_state";

    // Config events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
}

/// Correlation fields carried by every event of one fit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogContext {
    pub run_id: String,
    /// Origin of the configuration the run used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_source: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            config_source: None,
        }
    }

    pub fn with_config_source(mut self, source: impl Into<String>) -> Self {
        self.config_source = Some(source.into());
        self
    }
}

//! Contract of the external conversion engine (Rime).
//!
//! The engine is opaque to this crate: it ranks candidates for a composition,
//! commits one of them by index, and redeploys itself from user data.

use serde::{Deserialize, Serialize};

use crate::config::Configuration;

/// One ranked candidate in the engine's current menu.
///
/// Identity is `index` within a single snapshot; selection is always by
/// index, never by content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSuggestion {
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CandidateSuggestion {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine unavailable")]
    Unavailable,
    #[error("engine error: {0}")]
    Failed(String),
}

/// Conversion engine service. Calls may block; callers run them off the
/// input thread.
pub trait CandidateEngine: Send + Sync {
    fn query_candidates(&self, composition: &str) -> Result<Vec<CandidateSuggestion>, EngineError>;

    /// Commit the candidate at `index` of the engine's current menu.
    /// `None` means the index is invalid or stale.
    fn commit_candidate(&self, index: usize) -> Option<String>;

    fn redeploy(&self, configuration: &Configuration) -> Result<(), EngineError>;
}

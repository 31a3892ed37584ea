use std::sync::Arc;

use hime_core::config::Configuration;
use hime_core::engine::{CandidateEngine, CandidateSuggestion, EngineError};

use super::{HimeCandidate, HimeError};

/// Conversion engine implemented by the host (Rime on iOS).
///
/// Calls arrive on background threads and may block.
#[uniffi::export(with_foreign)]
pub trait HimeRimeEngine: Send + Sync {
    fn query_candidates(&self, composition: String) -> Result<Vec<HimeCandidate>, HimeError>;

    /// `None` when `index` is not in the engine's current menu.
    fn commit_candidate(&self, index: u32) -> Option<String>;

    /// Rebuild the engine from user data. `configuration_json` is the
    /// effective configuration serialized as JSON.
    fn redeploy(&self, configuration_json: String) -> Result<(), HimeError>;
}

/// Adapts the foreign engine to the core engine contract.
pub(crate) struct ForeignEngine {
    inner: Arc<dyn HimeRimeEngine>,
}

impl ForeignEngine {
    pub(crate) fn new(inner: Arc<dyn HimeRimeEngine>) -> Self {
        Self { inner }
    }
}

impl CandidateEngine for ForeignEngine {
    fn query_candidates(&self, composition: &str) -> Result<Vec<CandidateSuggestion>, EngineError> {
        self.inner
            .query_candidates(composition.to_string())
            .map(|candidates| candidates.into_iter().map(CandidateSuggestion::from).collect())
            .map_err(|e| EngineError::Failed(e.to_string()))
    }

    fn commit_candidate(&self, index: usize) -> Option<String> {
        let index = u32::try_from(index).ok()?;
        self.inner.commit_candidate(index)
    }

    fn redeploy(&self, configuration: &Configuration) -> Result<(), EngineError> {
        let json = serde_json::to_string(configuration)
            .map_err(|e| EngineError::Failed(e.to_string()))?;
        self.inner
            .redeploy(json)
            .map_err(|e| EngineError::Failed(e.to_string()))
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hime_core::engine::CandidateEngine;
use hime_session::{CandidateSession, SessionConfig, SessionResponse};

use crate::async_worker::AsyncWorker;

use super::types::{HimeCandidate, HimeCompositionEdit, HimeEvent, HimeResponse, HimeViewState};
use super::HimeError;

/// One text-input session: composition, candidate menu, and candidate bar.
///
/// Engine calls run on the worker; their results are applied only in
/// `poll`, on the caller's thread.
#[derive(uniffi::Object)]
pub struct HimeSession {
    session: Mutex<CandidateSession>,
    worker: AsyncWorker,
}

#[uniffi::export]
impl HimeSession {
    pub fn update_composition(&self, edit: HimeCompositionEdit) -> HimeResponse {
        // Results for the previous composition are stale from here on
        self.worker.invalidate_queries();
        let resp = self.lock().update_composition(edit.into());
        self.dispatch(resp)
    }

    pub fn select_candidate(&self, index: u32) -> HimeResponse {
        let resp = self.lock().select_candidate(index as usize);
        self.dispatch(resp)
    }

    pub fn toggle_view_state(&self) -> HimeResponse {
        let resp = self.lock().toggle_view_state();
        self.dispatch(resp)
    }

    pub fn reset(&self) -> HimeResponse {
        self.worker.invalidate_queries();
        let resp = self.lock().reset();
        self.dispatch(resp)
    }

    /// Apply the next engine result that is still current, if any.
    pub fn poll(&self) -> Option<HimeResponse> {
        while let Some(result) = self.worker.try_recv_commit() {
            let resp = self.lock().receive_commit(result.snapshot, result.text);
            if let Some(resp) = resp {
                return Some(self.dispatch(resp));
            }
        }
        while let Some(result) = self.worker.try_recv_query() {
            let resp = self
                .lock()
                .receive_candidates(result.snapshot, result.candidates);
            if let Some(resp) = resp {
                return Some(self.dispatch(resp));
            }
        }
        None
    }

    pub fn is_composing(&self) -> bool {
        self.lock().is_composing()
    }

    pub fn composition(&self) -> String {
        self.lock().composition().to_string()
    }

    pub fn candidates(&self) -> Vec<HimeCandidate> {
        self.lock()
            .candidates()
            .iter()
            .cloned()
            .map(HimeCandidate::from)
            .collect()
    }

    pub fn view_state(&self) -> HimeViewState {
        self.lock().view_state().into()
    }
}

impl HimeSession {
    pub(super) fn new(
        engine: Arc<dyn CandidateEngine>,
        config: SessionConfig,
    ) -> Result<Arc<Self>, HimeError> {
        let worker = AsyncWorker::new(engine).map_err(|e| HimeError::Internal {
            msg: format!("failed to start session worker: {e}"),
        })?;
        Ok(Arc::new(Self {
            session: Mutex::new(CandidateSession::new(config)),
            worker,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, CandidateSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand async requests to the worker and convert events for the host.
    fn dispatch(&self, resp: SessionResponse) -> HimeResponse {
        let SessionResponse {
            events,
            query,
            commit,
        } = resp;
        let has_pending_work = query.is_some() || commit.is_some();
        if let Some(query) = query {
            self.worker.submit_query(query);
        }
        if let Some(commit) = commit {
            self.worker.submit_commit(commit);
        }

        let mut events: Vec<HimeEvent> = events.into_iter().map(HimeEvent::from).collect();
        let handled = !events.is_empty() || has_pending_work;
        if has_pending_work {
            events.push(HimeEvent::SchedulePoll);
        }
        HimeResponse { handled, events }
    }
}

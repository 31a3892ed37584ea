//! Candidate session controller: composition, candidate menu, selection, and
//! the candidate bar layout.
//!
//! `CandidateSession` is synchronous and never talks to the engine. Every
//! operation returns a `SessionResponse` with presentation events plus, when
//! needed, a query or commit request for the caller to run asynchronously.
//! Results come back tagged with the snapshot id they were issued for, and
//! anything older than the current snapshot is dropped.

mod commit;
mod composing;
mod types;

#[cfg(test)]
mod tests;

use hime_core::engine::CandidateSuggestion;

pub use types::{
    CandidateQuery, CandidatesViewState, CommitRequest, CompositionEdit, SessionConfig,
    SessionEvent, SessionResponse,
};

use types::{CandidateMenu, SessionState};

pub struct CandidateSession {
    config: SessionConfig,
    state: SessionState,
    menu: CandidateMenu,
    view_state: CandidatesViewState,
    /// Bumped on every composition change and reset.
    snapshot: u64,
}

impl CandidateSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            view_state: config.initial_view_state(),
            config,
            state: SessionState::Idle,
            menu: CandidateMenu::default(),
            snapshot: 0,
        }
    }

    /// Applies to candidates received from now on.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn is_composing(&self) -> bool {
        !matches!(self.state, SessionState::Idle)
    }

    pub fn composition(&self) -> &str {
        self.state.composition()
    }

    pub fn candidates(&self) -> &[CandidateSuggestion] {
        &self.menu.items
    }

    pub fn view_state(&self) -> CandidatesViewState {
        self.view_state
    }

    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    /// Index of the commit in flight, if any.
    pub fn pending_commit(&self) -> Option<usize> {
        match self.state {
            SessionState::Selecting { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Flip between the collapsed and expanded candidate bar. Composition,
    /// candidates, and in-flight requests are untouched.
    pub fn toggle_view_state(&mut self) -> SessionResponse {
        self.view_state = self.view_state.toggled();
        SessionResponse::with_event(SessionEvent::ViewStateChanged(self.view_state))
    }

    /// Drop the composition and candidates. In-flight results become stale.
    pub fn reset(&mut self) -> SessionResponse {
        self.snapshot += 1;
        let mut resp = SessionResponse::default();
        if self.is_composing() {
            self.state = SessionState::Idle;
            resp.push(SessionEvent::CompositionChanged(String::new()));
        }
        self.clear_menu(&mut resp);
        resp
    }

    fn clear_menu(&mut self, resp: &mut SessionResponse) {
        self.menu.snapshot = self.snapshot;
        if !self.menu.items.is_empty() {
            self.menu.items.clear();
            resp.push(SessionEvent::CandidatesChanged(Vec::new()));
        }
    }
}

impl Default for CandidateSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

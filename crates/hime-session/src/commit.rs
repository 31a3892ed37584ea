use tracing::{debug, debug_span};

use super::types::{CandidatesViewState, CommitRequest, SessionEvent, SessionResponse, SessionState};
use super::CandidateSession;

impl CandidateSession {
    /// Ask to commit the candidate at `index` of the displayed menu.
    ///
    /// An index outside the menu, a menu left over from an earlier
    /// composition, or a commit already in flight only resets the scroll
    /// position.
    pub fn select_candidate(&mut self, index: usize) -> SessionResponse {
        let _span = debug_span!("select_candidate", index).entered();
        let SessionState::Composing(composition) = &self.state else {
            debug!("select ignored: no composition awaiting selection");
            return SessionResponse::with_event(SessionEvent::ResetScroll);
        };
        if index >= self.menu.items.len() || self.menu.snapshot != self.snapshot {
            debug!(
                candidates = self.menu.items.len(),
                "select ignored: index outside current menu"
            );
            return SessionResponse::with_event(SessionEvent::ResetScroll);
        }

        self.state = SessionState::Selecting {
            composition: composition.clone(),
            index,
        };
        SessionResponse {
            commit: Some(CommitRequest {
                index,
                snapshot: self.snapshot,
            }),
            ..SessionResponse::default()
        }
    }

    /// Apply the engine's answer to a commit request.
    ///
    /// Committed text is inserted, then the session resets and the candidate
    /// bar collapses. A rejected commit resets the scroll position and keeps
    /// the composition. Stale answers return `None`.
    pub fn receive_commit(
        &mut self,
        snapshot: u64,
        committed: Option<String>,
    ) -> Option<SessionResponse> {
        let SessionState::Selecting { composition, .. } = &self.state else {
            debug!("discarding commit result: no selection in flight");
            return None;
        };
        if snapshot != self.snapshot {
            debug!(snapshot, current = self.snapshot, "discarding stale commit result");
            return None;
        }

        let Some(text) = committed else {
            self.state = SessionState::Composing(composition.clone());
            return Some(SessionResponse::with_event(SessionEvent::ResetScroll));
        };

        let mut resp = SessionResponse::default();
        if !text.is_empty() {
            resp.push(SessionEvent::InsertText(text));
        }
        resp.events.extend(self.reset().events);
        if self.view_state != CandidatesViewState::Collapsed {
            self.view_state = CandidatesViewState::Collapsed;
            resp.push(SessionEvent::ViewStateChanged(self.view_state));
        }
        Some(resp)
    }
}

use tracing::{debug, debug_span};

use hime_core::engine::CandidateSuggestion;

use super::types::{CandidateQuery, CompositionEdit, SessionEvent, SessionResponse, SessionState};
use super::CandidateSession;

impl CandidateSession {
    /// Apply an edit to the composition. A non-empty result issues a
    /// candidate query; an empty one returns to idle.
    pub fn update_composition(&mut self, edit: CompositionEdit) -> SessionResponse {
        let _span = debug_span!("update_composition", ?edit).entered();
        let current = self.state.composition();
        let next = match edit {
            CompositionEdit::Insert(text) => format!("{current}{text}"),
            CompositionEdit::Backspace => {
                let mut s = current.to_string();
                s.pop();
                s
            }
            CompositionEdit::Replace(text) => text,
            CompositionEdit::Clear => String::new(),
        };

        if !self.is_composing() && next.is_empty() {
            return SessionResponse::default();
        }

        self.snapshot += 1;
        let mut resp = SessionResponse::default();
        resp.push(SessionEvent::CompositionChanged(next.clone()));

        if next.is_empty() {
            self.state = SessionState::Idle;
            self.clear_menu(&mut resp);
            return resp;
        }

        // An edit during selection abandons the commit in flight.
        self.state = SessionState::Composing(next.clone());
        resp.query = Some(CandidateQuery {
            composition: next,
            snapshot: self.snapshot,
        });
        resp
    }

    /// Install candidates produced for `snapshot`. Returns `None` when the
    /// result is stale or the session is idle.
    pub fn receive_candidates(
        &mut self,
        snapshot: u64,
        candidates: Vec<CandidateSuggestion>,
    ) -> Option<SessionResponse> {
        if snapshot != self.snapshot || !self.is_composing() {
            debug!(snapshot, current = self.snapshot, "discarding stale candidates");
            return None;
        }

        let limit = self.config.max_candidates.unwrap_or(usize::MAX);
        let items: Vec<CandidateSuggestion> = candidates
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, c)| CandidateSuggestion { index, ..c })
            .collect();

        self.menu.items = items.clone();
        self.menu.snapshot = snapshot;

        Some(SessionResponse::with_event(SessionEvent::CandidatesChanged(items)))
    }
}

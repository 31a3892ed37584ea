
use hime_core::engine::CandidateSuggestion;

use super::{CandidateSession, CompositionEdit, SessionResponse};

/// Small in-memory "engine" menu keyed by composition.
pub(super) fn lookup(composition: &str) -> Vec<CandidateSuggestion> {
    let surfaces: &[&str] = match composition {
        "n" => &["你", "那", "呢"],
        "ni" => &["你", "尼", "泥", "逆"],
        "nih" => &["你好"],
        "nihao" => &["你好", "拟好"],
        _ => &[],
    };
    surfaces
        .iter()
        .enumerate()
        .map(|(i, s)| CandidateSuggestion::new(i, *s))
        .collect()
}

// Helper: type a string one character at a time, returning the responses
pub(super) fn type_string(session: &mut CandidateSession, s: &str) -> Vec<SessionResponse> {
    s.chars()
        .map(|c| session.update_composition(CompositionEdit::Insert(c.to_string())))
        .collect()
}

/// Run the query of `resp` against `lookup` and feed the result back.
pub(super) fn answer_query(
    session: &mut CandidateSession,
    resp: &SessionResponse,
) -> Option<SessionResponse> {
    let query = resp.query.as_ref()?;
    session.receive_candidates(query.snapshot, lookup(&query.composition))
}

/// Type `s` and answer only the last query, as a draining worker would.
pub(super) fn type_and_answer(session: &mut CandidateSession, s: &str) {
    let responses = type_string(session, s);
    if let Some(last) = responses.last() {
        answer_query(session, last);
    }
}

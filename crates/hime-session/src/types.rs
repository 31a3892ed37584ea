use hime_core::config::Configuration;
use hime_core::engine::CandidateSuggestion;

/// Layout of the candidate bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidatesViewState {
    /// Single horizontal row.
    Collapsed,
    /// Full grid.
    Expanded,
}

impl CandidatesViewState {
    pub fn toggled(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }
}

/// One edit to the pending composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionEdit {
    Insert(String),
    Backspace,
    Replace(String),
    Clear,
}

/// Presentation notification. The session is the only publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CompositionChanged(String),
    CandidatesChanged(Vec<CandidateSuggestion>),
    ViewStateChanged(CandidatesViewState),
    /// Text to insert into the host document.
    InsertText(String),
    /// Scroll the candidate list back to its start.
    ResetScroll,
}

/// Candidate lookup the caller must run for `composition`, then feed back
/// through `receive_candidates` with the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub composition: String,
    pub snapshot: u64,
}

/// Engine commit the caller must run, then feed back through
/// `receive_commit` with the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitRequest {
    pub index: usize,
    pub snapshot: u64,
}

/// Response from every session operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResponse {
    pub events: Vec<SessionEvent>,
    pub query: Option<CandidateQuery>,
    pub commit: Option<CommitRequest>,
}

impl SessionResponse {
    pub(crate) fn with_event(event: SessionEvent) -> Self {
        Self {
            events: vec![event],
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.query.is_none() && self.commit.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Upper bound on displayed candidates; `None` keeps everything.
    pub max_candidates: Option<usize>,
    pub expand_on_open: bool,
}

impl SessionConfig {
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self {
            max_candidates: configuration.maximum_number_of_candidate_words(),
            expand_on_open: configuration.expand_candidates_on_open(),
        }
    }

    pub(crate) fn initial_view_state(&self) -> CandidatesViewState {
        if self.expand_on_open {
            CandidatesViewState::Expanded
        } else {
            CandidatesViewState::Collapsed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionState {
    Idle,
    Composing(String),
    /// A commit for `index` is in flight.
    Selecting { composition: String, index: usize },
}

impl SessionState {
    pub(crate) fn composition(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Composing(c) | Self::Selecting { composition: c, .. } => c,
        }
    }
}

/// Candidates as last received, tagged with the snapshot they belong to.
#[derive(Debug, Clone, Default)]
pub(crate) struct CandidateMenu {
    pub items: Vec<CandidateSuggestion>,
    pub snapshot: u64,
}

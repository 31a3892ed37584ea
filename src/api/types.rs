use hime_core::config::ConfigError;
use hime_core::engine::CandidateSuggestion;
use hime_core::import::ImportError;
use hime_core::schema::SchemaError;
use hime_core::slide::{KeyboardAction, SlideFunction};
use hime_session::{CandidatesViewState, CompositionEdit, SessionEvent};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HimeError {
    #[error("IO error: {msg}")]
    Io { msg: String },
    #[error("invalid data: {msg}")]
    InvalidData { msg: String },
    /// The request was refused and nothing changed.
    #[error("rejected: {msg}")]
    Rejected { msg: String },
    #[error("internal error: {msg}")]
    Internal { msg: String },
}

impl From<ConfigError> for HimeError {
    fn from(e: ConfigError) -> Self {
        let msg = e.to_string();
        match e {
            ConfigError::Io(_) | ConfigError::Persist(_) => Self::Io { msg },
            ConfigError::Parse(_) | ConfigError::InvalidValue { .. } => Self::InvalidData { msg },
        }
    }
}

impl From<SchemaError> for HimeError {
    fn from(e: SchemaError) -> Self {
        Self::Rejected { msg: e.to_string() }
    }
}

impl From<ImportError> for HimeError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::InProgress => Self::Rejected { msg: e.to_string() },
            ImportError::Archive(_) => Self::InvalidData { msg: e.to_string() },
            ImportError::Config(inner) => inner.into(),
            ImportError::Deploy(_) => Self::Internal { msg: e.to_string() },
            ImportError::Io(_) => Self::Io { msg: e.to_string() },
        }
    }
}

impl From<uniffi::UnexpectedUniFFICallbackError> for HimeError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::Internal { msg: e.reason }
    }
}

// ---------------------------------------------------------------------------
// Records (value types, copied across FFI boundary)
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct HimeCandidate {
    pub index: u32,
    pub text: String,
    pub comment: Option<String>,
}

impl From<CandidateSuggestion> for HimeCandidate {
    fn from(c: CandidateSuggestion) -> Self {
        Self {
            index: c.index as u32,
            text: c.text,
            comment: c.comment,
        }
    }
}

impl From<HimeCandidate> for CandidateSuggestion {
    fn from(c: HimeCandidate) -> Self {
        Self {
            index: c.index as usize,
            text: c.text,
            comment: c.comment,
        }
    }
}

/// Event-driven response from every keyboard and session call.
#[derive(Clone, Debug, uniffi::Record)]
pub struct HimeResponse {
    /// False when the input had no effect (e.g. no slide binding).
    pub handled: bool,
    pub events: Vec<HimeEvent>,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HimeViewState {
    Collapsed,
    Expanded,
}

impl From<CandidatesViewState> for HimeViewState {
    fn from(s: CandidatesViewState) -> Self {
        match s {
            CandidatesViewState::Collapsed => Self::Collapsed,
            CandidatesViewState::Expanded => Self::Expanded,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HimeSlideFunction {
    SimplifiedTraditionalSwitch,
    ChineseEnglishSwitch,
    SelectSecond,
    BeginOfSentence,
    EndOfSentence,
}

impl From<SlideFunction> for HimeSlideFunction {
    fn from(f: SlideFunction) -> Self {
        match f {
            SlideFunction::SimplifiedTraditionalSwitch => Self::SimplifiedTraditionalSwitch,
            SlideFunction::ChineseEnglishSwitch => Self::ChineseEnglishSwitch,
            SlideFunction::SelectSecond => Self::SelectSecond,
            SlideFunction::BeginOfSentence => Self::BeginOfSentence,
            SlideFunction::EndOfSentence => Self::EndOfSentence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HimeKeyAction {
    Character { text: String },
    Space,
    Backspace,
    Enter,
    Shift,
    NextKeyboard,
}

impl From<HimeKeyAction> for KeyboardAction {
    fn from(a: HimeKeyAction) -> Self {
        match a {
            HimeKeyAction::Character { text } => Self::Character(text),
            HimeKeyAction::Space => Self::Space,
            HimeKeyAction::Backspace => Self::Backspace,
            HimeKeyAction::Enter => Self::Enter,
            HimeKeyAction::Shift => Self::Shift,
            HimeKeyAction::NextKeyboard => Self::NextKeyboard,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HimeCompositionEdit {
    Insert { text: String },
    Backspace,
    Replace { text: String },
    Clear,
}

impl From<HimeCompositionEdit> for CompositionEdit {
    fn from(e: HimeCompositionEdit) -> Self {
        match e {
            HimeCompositionEdit::Insert { text } => Self::Insert(text),
            HimeCompositionEdit::Backspace => Self::Backspace,
            HimeCompositionEdit::Replace { text } => Self::Replace(text),
            HimeCompositionEdit::Clear => Self::Clear,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum HimeEvent {
    CompositionChanged { text: String },
    CandidatesChanged { candidates: Vec<HimeCandidate> },
    ViewStateChanged { state: HimeViewState },
    InsertText { text: String },
    ResetScroll,
    MoveCursor { offset: i32 },
    PerformFunction { function: HimeSlideFunction },
    ConfigurationChanged,
    SchemasChanged { schemas: Vec<String> },
    /// Engine work is in flight; call `poll` again shortly.
    SchedulePoll,
}

impl From<SessionEvent> for HimeEvent {
    fn from(e: SessionEvent) -> Self {
        match e {
            SessionEvent::CompositionChanged(text) => Self::CompositionChanged { text },
            SessionEvent::CandidatesChanged(candidates) => Self::CandidatesChanged {
                candidates: candidates.into_iter().map(HimeCandidate::from).collect(),
            },
            SessionEvent::ViewStateChanged(state) => Self::ViewStateChanged {
                state: state.into(),
            },
            SessionEvent::InsertText(text) => Self::InsertText { text },
            SessionEvent::ResetScroll => Self::ResetScroll,
        }
    }
}

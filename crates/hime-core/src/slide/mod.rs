//! Up/down slide bindings on character keys.
//!
//! The raw source is a flat map of `"<character><marker>" → value`, where the
//! marker is `↑` or `↓`. A value starting with `#` (and longer than the marker
//! itself) names a keyboard function; anything else is literal text.

mod resolver;

pub use resolver::{GestureResolver, KeyboardAction, SlideAction, SlideTarget};

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

pub const SLIDE_UP_MARKER: char = '↑';
pub const SLIDE_DOWN_MARKER: char = '↓';
pub const FUNCTION_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideDirection {
    Up,
    Down,
}

impl SlideDirection {
    /// Negative vertical offsets slide down; zero and positive slide up.
    pub fn from_offset(offset: i32) -> Self {
        if offset < 0 {
            Self::Down
        } else {
            Self::Up
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            SLIDE_UP_MARKER => Some(Self::Up),
            SLIDE_DOWN_MARKER => Some(Self::Down),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Self::Up => SLIDE_UP_MARKER,
            Self::Down => SLIDE_DOWN_MARKER,
        }
    }
}

/// Closed set of keyboard-level functions a slide can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideFunction {
    SimplifiedTraditionalSwitch,
    ChineseEnglishSwitch,
    SelectSecond,
    BeginOfSentence,
    EndOfSentence,
}

impl SlideFunction {
    pub const ALL: [SlideFunction; 5] = [
        Self::SimplifiedTraditionalSwitch,
        Self::ChineseEnglishSwitch,
        Self::SelectSecond,
        Self::BeginOfSentence,
        Self::EndOfSentence,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }

    /// Raw tag as written in configuration, marker included.
    pub fn tag(self) -> &'static str {
        match self {
            Self::SimplifiedTraditionalSwitch => "#简繁切换",
            Self::ChineseEnglishSwitch => "#中英切换",
            Self::SelectSecond => "#次选上屏",
            Self::BeginOfSentence => "#行首",
            Self::EndOfSentence => "#行尾",
        }
    }

    /// Short text shown on the key face.
    pub fn label(self) -> &'static str {
        match self {
            Self::SimplifiedTraditionalSwitch => "简繁",
            Self::ChineseEnglishSwitch => "中英",
            Self::SelectSecond => "次选",
            Self::BeginOfSentence => "行首",
            Self::EndOfSentence => "行尾",
        }
    }
}

/// A function reference, recognized or not. Unrecognized tags are kept so
/// that dispatch can log them instead of silently dropping them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionTag {
    Known(SlideFunction),
    Unrecognized(String),
}

impl FunctionTag {
    pub fn parse(raw: &str) -> Self {
        match SlideFunction::from_tag(raw) {
            Some(f) => Self::Known(f),
            None => Self::Unrecognized(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideBinding {
    Literal(String),
    Function(FunctionTag),
}

impl SlideBinding {
    pub fn parse(value: &str) -> Self {
        if value.starts_with(FUNCTION_MARKER) && value.chars().count() > 1 {
            Self::Function(FunctionTag::parse(value))
        } else {
            Self::Literal(value.to_string())
        }
    }

    /// Text used for the on-key annotation.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Function(FunctionTag::Known(f)) => f.label(),
            Self::Function(FunctionTag::Unrecognized(raw)) => raw,
        }
    }
}

/// Immutable `(character, direction) → binding` table, rebuilt whenever the
/// raw binding source changes.
#[derive(Debug, Clone, Default)]
pub struct SlideBindingTable {
    bindings: HashMap<(String, SlideDirection), SlideBinding>,
}

impl SlideBindingTable {
    pub fn from_raw(raw: &BTreeMap<String, String>) -> Self {
        let mut bindings = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let Some((character, direction)) = split_key(key) else {
                debug!(key = %key, "skipping slide binding without direction marker");
                continue;
            };
            if value.is_empty() {
                debug!(key = %key, "skipping empty slide binding");
                continue;
            }
            bindings.insert(
                (character.to_string(), direction),
                SlideBinding::parse(value),
            );
        }
        Self { bindings }
    }

    pub fn get(&self, character: &str, direction: SlideDirection) -> Option<&SlideBinding> {
        self.bindings.get(&(character.to_string(), direction))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Up text and down text joined by a space; a missing side contributes
    /// nothing.
    pub fn display_hint(&self, character: &str) -> String {
        let up = self.get(character, SlideDirection::Up);
        let down = self.get(character, SlideDirection::Down);
        match (up, down) {
            (Some(u), Some(d)) => format!("{} {}", u.display_text(), d.display_text()),
            (Some(b), None) | (None, Some(b)) => b.display_text().to_string(),
            (None, None) => String::new(),
        }
    }

    /// Hints for every bound character, sorted by character.
    pub fn display_hints(&self) -> BTreeMap<String, String> {
        let characters: BTreeSet<&str> = self.bindings.keys().map(|(c, _)| c.as_str()).collect();
        characters
            .into_iter()
            .map(|c| (c.to_string(), self.display_hint(c)))
            .collect()
    }
}

fn split_key(key: &str) -> Option<(&str, SlideDirection)> {
    let mut chars = key.chars();
    let direction = SlideDirection::from_marker(chars.next_back()?)?;
    let character = chars.as_str();
    if character.is_empty() {
        return None;
    }
    Some((character, direction))
}

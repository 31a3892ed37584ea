use tracing::{debug, debug_span};

use super::{FunctionTag, SlideBinding, SlideBindingTable, SlideDirection, SlideFunction};
use crate::config::Configuration;

/// Logical action of a pressed key. Only `Character` keys are slide-enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardAction {
    Character(String),
    Space,
    Backspace,
    Enter,
    Shift,
    NextKeyboard,
}

/// What a resolved gesture asks the keyboard to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideAction {
    /// Insert `text`; multi-codepoint text moves the cursor back by one so
    /// it lands inside paired symbols.
    InsertText(String),
    Perform(SlideFunction),
    /// A `#`-prefixed value that names no known function.
    Unrecognized(String),
    MoveCursor(i32),
}

/// Text document plus keyboard-level operations a slide may touch.
pub trait SlideTarget {
    fn insert_text(&mut self, text: &str);
    fn move_cursor(&mut self, offset: i32);
    fn perform(&mut self, function: SlideFunction);
}

pub struct GestureResolver {
    table: SlideBindingTable,
    hints_enabled: bool,
    space_drag_enabled: bool,
}

impl GestureResolver {
    pub fn new(table: SlideBindingTable) -> Self {
        Self {
            table,
            hints_enabled: true,
            space_drag_enabled: true,
        }
    }

    pub fn from_configuration(configuration: &Configuration) -> Self {
        let swipe = configuration.swipe.as_ref();
        let table = swipe
            .and_then(|s| s.up_and_down_slide_symbols.as_ref())
            .map(SlideBindingTable::from_raw)
            .unwrap_or_default();
        Self {
            table,
            hints_enabled: swipe
                .and_then(|s| s.enable_keyboard_up_and_down_slide_symbol)
                .unwrap_or(true),
            space_drag_enabled: swipe.and_then(|s| s.slide_by_space_button).unwrap_or(true),
        }
    }

    pub fn table(&self) -> &SlideBindingTable {
        &self.table
    }

    /// Resolve a vertical drag of `offset` on `action` without side effects.
    pub fn resolve(&self, action: &KeyboardAction, offset: i32) -> Option<SlideAction> {
        let KeyboardAction::Character(character) = action else {
            return None;
        };
        let direction = SlideDirection::from_offset(offset);
        let binding = self.table.get(&character.to_lowercase(), direction)?;
        Some(match binding {
            SlideBinding::Literal(text) => SlideAction::InsertText(text.clone()),
            SlideBinding::Function(FunctionTag::Known(f)) => SlideAction::Perform(*f),
            SlideBinding::Function(FunctionTag::Unrecognized(raw)) => {
                SlideAction::Unrecognized(raw.clone())
            }
        })
    }

    /// Resolve and apply a slide. Returns `false` when nothing happened.
    pub fn dispatch(
        &self,
        action: &KeyboardAction,
        offset: i32,
        target: &mut dyn SlideTarget,
    ) -> bool {
        let _span = debug_span!("slide", ?action, offset).entered();
        match self.resolve(action, offset) {
            Some(resolved) => apply(resolved, target),
            None => {
                debug!("no slide binding");
                false
            }
        }
    }

    /// Horizontal drag on the space key moves the cursor by `dx` positions.
    pub fn resolve_space_drag(&self, dx: i32) -> Option<SlideAction> {
        if !self.space_drag_enabled || dx == 0 {
            return None;
        }
        Some(SlideAction::MoveCursor(dx))
    }

    pub fn dispatch_space_drag(&self, dx: i32, target: &mut dyn SlideTarget) -> bool {
        match self.resolve_space_drag(dx) {
            Some(resolved) => apply(resolved, target),
            None => false,
        }
    }

    /// On-key hint for `character`, empty when slide symbols are hidden.
    pub fn hint_for(&self, character: &str) -> String {
        if !self.hints_enabled {
            return String::new();
        }
        self.table.display_hint(&character.to_lowercase())
    }
}

fn apply(action: SlideAction, target: &mut dyn SlideTarget) -> bool {
    match action {
        SlideAction::InsertText(text) => {
            target.insert_text(&text);
            if text.chars().count() > 1 {
                target.move_cursor(-1);
            }
            true
        }
        SlideAction::Perform(function) => {
            target.perform(function);
            true
        }
        SlideAction::Unrecognized(raw) => {
            debug!(tag = %raw, "ignoring unrecognized slide function");
            false
        }
        SlideAction::MoveCursor(offset) => {
            target.move_cursor(offset);
            true
        }
    }
}

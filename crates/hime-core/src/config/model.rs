use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field-level override of one configuration layer by a higher one.
///
/// Absent patch fields inherit, scalars and lists are replaced, records and
/// maps merge key by key.
pub trait Overlay {
    fn overlay(&mut self, patch: &Self);
}

macro_rules! replace_overlay {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Overlay for $ty {
                fn overlay(&mut self, patch: &Self) {
                    self.clone_from(patch);
                }
            }
        )*
    };
}

replace_overlay!(bool, u8, u32, String);

// Lists are never concatenated or deduplicated.
impl<T: Clone> Overlay for Vec<T> {
    fn overlay(&mut self, patch: &Self) {
        self.clone_from(patch);
    }
}

impl<V: Overlay + Clone> Overlay for BTreeMap<String, V> {
    fn overlay(&mut self, patch: &Self) {
        for (key, value) in patch {
            match self.get_mut(key) {
                Some(existing) => existing.overlay(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

impl<T: Overlay + Clone> Overlay for Option<T> {
    fn overlay(&mut self, patch: &Self) {
        let Some(patch) = patch else {
            return;
        };
        match self {
            Some(base) => base.overlay(patch),
            None => *self = Some(patch.clone()),
        }
    }
}

macro_rules! impl_overlay {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl Overlay for $ty {
            fn overlay(&mut self, patch: &Self) {
                $( self.$field.overlay(&patch.$field); )*
            }
        }
    };
}

/// Effective (or layer) configuration. Every field is independently
/// optional; `None` means "inherit from the layer below".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<KeyboardConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolbar: Option<ToolbarConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swipe: Option<SwipeConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rime: Option<RimeConfiguration>,
}

impl_overlay!(Configuration {
    general,
    keyboard,
    toolbar,
    swipe,
    rime
});

impl Configuration {
    /// Merge `patch` into `self` in place. Idempotent.
    pub fn merge(&mut self, patch: &Configuration) {
        self.overlay(patch);
    }

    pub fn merged(mut self, patch: &Configuration) -> Configuration {
        self.merge(patch);
        self
    }

    pub fn selected_schemas(&self) -> Option<&[String]> {
        self.rime
            .as_ref()
            .and_then(|r| r.selected_schemas.as_deref())
    }

    pub fn maximum_number_of_candidate_words(&self) -> Option<usize> {
        self.rime
            .as_ref()
            .and_then(|r| r.maximum_number_of_candidate_words)
            .map(|n| n as usize)
    }

    pub fn expand_candidates_on_open(&self) -> bool {
        self.toolbar
            .as_ref()
            .and_then(|t| t.expand_candidates_on_open)
            .unwrap_or(false)
    }
}

/// Partial overlay document. On disk the overrides sit under a top-level
/// `patch` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Configuration>,
}

impl ConfigurationPatch {
    pub fn new(patch: Configuration) -> Self {
        Self { patch: Some(patch) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_appearance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_keyboard_dismiss_button: Option<bool>,
}

impl_overlay!(GeneralConfiguration {
    enable_appearance,
    enable_keyboard_dismiss_button
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_button_bubbles: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_key_sounds: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_haptic_feedback: Option<bool>,
    /// 0 (weakest) to 4 (strongest).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub haptic_feedback_intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_semicolon_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_space_left_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_value_of_space_left_button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_space_right_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_value_of_space_right_button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_chinese_english_switch_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chinese_english_switch_button_is_on_left_of_space_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_nine_grid_of_numeric_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enter_directly_on_screen_by_nine_grid_of_numeric_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_of_grid_of_numeric_keyboard: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_lower_case_of_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_embedded_input_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_of_one_handed_keyboard: Option<u32>,
    /// Symbols after which the cursor steps back one position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_of_cursor_back: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_of_return_to_main_keyboard: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs_of_symbols: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_symbol_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_for_symbol_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_color_schema: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_color_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_schemas: Option<BTreeMap<String, KeyboardColorSchema>>,
}

impl_overlay!(KeyboardConfiguration {
    display_button_bubbles,
    enable_key_sounds,
    enable_haptic_feedback,
    haptic_feedback_intensity,
    display_semicolon_button,
    display_space_left_button,
    key_value_of_space_left_button,
    display_space_right_button,
    key_value_of_space_right_button,
    display_chinese_english_switch_button,
    chinese_english_switch_button_is_on_left_of_space_button,
    enable_nine_grid_of_numeric_keyboard,
    enter_directly_on_screen_by_nine_grid_of_numeric_keyboard,
    symbols_of_grid_of_numeric_keyboard,
    auto_lower_case_of_keyboard,
    enable_embedded_input_mode,
    width_of_one_handed_keyboard,
    symbols_of_cursor_back,
    symbols_of_return_to_main_keyboard,
    pairs_of_symbols,
    enable_symbol_keyboard,
    lock_for_symbol_keyboard,
    enable_color_schema,
    use_color_schema,
    color_schemas,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardColorSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_back_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_pressed_back_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_front_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_pressed_front_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_swipe_front_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hilited_candidate_back_color: Option<String>,
}

impl_overlay!(KeyboardColorSchema {
    name,
    author,
    back_color,
    button_back_color,
    button_pressed_back_color,
    button_front_color,
    button_pressed_front_color,
    button_swipe_front_color,
    candidate_text_color,
    comment_text_color,
    hilited_candidate_back_color,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolbarConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_toolbar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_of_toolbar: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_of_coding_area: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coding_area_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_word_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_comment_font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_index_of_candidate_word: Option<bool>,
    /// Open the candidate bar in its expanded (vertical) layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand_candidates_on_open: Option<bool>,
}

impl_overlay!(ToolbarConfiguration {
    enable_toolbar,
    height_of_toolbar,
    height_of_coding_area,
    coding_area_font_size,
    candidate_word_font_size,
    candidate_comment_font_size,
    display_index_of_candidate_word,
    expand_candidates_on_open,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwipeConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_keyboard_up_and_down_slide_symbol: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_by_space_button: Option<bool>,
    /// Raw slide bindings, `"<character><↑|↓>" → value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_and_down_slide_symbols: Option<BTreeMap<String, String>>,
}

impl_overlay!(SwipeConfiguration {
    enable_keyboard_up_and_down_slide_symbol,
    slide_by_space_button,
    up_and_down_slide_symbols,
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RimeConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_number_of_candidate_words: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_schemas: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_user_data_when_deploying: Option<bool>,
}

impl_overlay!(RimeConfiguration {
    maximum_number_of_candidate_words,
    selected_schemas,
    overwrite_user_data_when_deploying,
});

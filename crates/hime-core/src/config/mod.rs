//! Layered keyboard configuration.
//!
//! Layers, lowest precedence first:
//! 1. the embedded default (`default_configuration.toml`)
//! 2. the last persisted effective configuration
//! 3. a discovered full document (`hamster.toml`), replacing the running one
//! 4. a discovered patch document (`hamster.custom.toml`), merged field by field
//!
//! `ConfigStore` owns the effective result; every write goes through its save
//! step.

mod model;
mod store;
#[cfg(test)]
mod tests;

pub use model::{
    Configuration, ConfigurationPatch, GeneralConfiguration, KeyboardColorSchema,
    KeyboardConfiguration, Overlay, RimeConfiguration, SwipeConfiguration, ToolbarConfiguration,
};
pub use store::{ConfigPersistence, ConfigStore, JsonFilePersistence, MemoryPersistence};

pub const DEFAULT_CONFIGURATION_TOML: &str = include_str!("default_configuration.toml");

/// File name of the full configuration document inside user data.
pub const BASE_DOCUMENT_NAME: &str = "hamster.toml";
/// File name of the patch document inside user data.
pub const PATCH_DOCUMENT_NAME: &str = "hamster.custom.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to persist configuration: {0}")]
    Persist(String),
}

/// Returns the embedded default configuration TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_CONFIGURATION_TOML
}

pub fn default_configuration() -> Result<Configuration, ConfigError> {
    parse_configuration_toml(DEFAULT_CONFIGURATION_TOML)
}

/// Parse and validate a full configuration document.
pub fn parse_configuration_toml(toml_str: &str) -> Result<Configuration, ConfigError> {
    let c: Configuration =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&c)?;
    Ok(c)
}

/// Parse and validate a patch document (`[patch.*]` tables).
pub fn parse_patch_toml(toml_str: &str) -> Result<ConfigurationPatch, ConfigError> {
    let p: ConfigurationPatch =
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
    if let Some(ref c) = p.patch {
        validate(c)?;
    }
    Ok(p)
}

/// Range checks on the fields that are present. Absent fields always pass.
pub fn validate(c: &Configuration) -> Result<(), ConfigError> {
    if let Some(intensity) = c.keyboard.as_ref().and_then(|k| k.haptic_feedback_intensity) {
        if intensity > 4 {
            return Err(invalid(
                "keyboard.haptic_feedback_intensity",
                "must be between 0 and 4",
            ));
        }
    }
    if let Some(rime) = &c.rime {
        if rime.maximum_number_of_candidate_words == Some(0) {
            return Err(invalid(
                "rime.maximum_number_of_candidate_words",
                "must be positive",
            ));
        }
        if rime.selected_schemas.as_ref().is_some_and(|s| s.is_empty()) {
            return Err(invalid(
                "rime.selected_schemas",
                "at least one schema must be selected",
            ));
        }
    }
    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

//! UniFFI export layer: Swift bindings for the Hime keyboard runtime.
//!
//! Each public type here maps to a generated Swift class, struct, or enum.

mod engine;
mod keyboard;
mod session;
mod types;


pub use engine::HimeRimeEngine;
pub use keyboard::HimeKeyboard;
pub use session::HimeSession;
pub use types::{
    HimeCandidate, HimeCompositionEdit, HimeError, HimeEvent, HimeKeyAction, HimeResponse,
    HimeSlideFunction, HimeViewState,
};

use std::path::Path;

// ---------------------------------------------------------------------------
// Top-level functions
// ---------------------------------------------------------------------------

#[uniffi::export]
fn engine_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[uniffi::export]
fn default_configuration_toml() -> String {
    hime_core::config::default_toml().to_string()
}

/// Parse and validate a full configuration document.
#[uniffi::export]
fn validate_configuration_toml(toml: String) -> Result<(), HimeError> {
    hime_core::config::parse_configuration_toml(&toml)?;
    Ok(())
}

#[uniffi::export]
fn trace_init(log_dir: String) {
    crate::trace_init::init_tracing(Path::new(&log_dir));
}

use std::fs;
use std::process;

use hime_core::config::{
    default_toml, parse_configuration_toml, parse_patch_toml, ConfigError, Configuration,
};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub(crate) use die;

pub fn config_export() {
    print!("{}", default_toml());
}

pub fn config_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let c = die!(parse_configuration_toml(&content), "Error: {}");
    let slides = c
        .swipe
        .as_ref()
        .and_then(|s| s.up_and_down_slide_symbols.as_ref())
        .map_or(0, |m| m.len());
    println!(
        "OK: schemas={:?}, max_candidates={:?}, slide_bindings={}",
        c.selected_schemas().unwrap_or_default(),
        c.maximum_number_of_candidate_words(),
        slides
    );
}

pub fn config_merge(base_file: &str, patch_file: &str, json: bool) {
    let base = die!(fs::read_to_string(base_file), "Error reading {base_file}: {}");
    let patch = die!(fs::read_to_string(patch_file), "Error reading {patch_file}: {}");
    let merged = die!(merge_documents(&base, &patch), "Error: {}");
    let out = die!(render(&merged, json), "Error: {}");
    print!("{out}");
}

/// Default ⊕ full document ⊕ patch document, as the keyboard layers them.
pub fn merge_documents(base_toml: &str, patch_toml: &str) -> Result<Configuration, ConfigError> {
    let base = parse_configuration_toml(base_toml)?;
    let mut merged = hime_core::config::default_configuration()?.merged(&base);
    if let Some(patch) = parse_patch_toml(patch_toml)?.patch {
        merged.merge(&patch);
    }
    Ok(merged)
}

pub fn render(c: &Configuration, json: bool) -> Result<String, ConfigError> {
    if json {
        let mut s = serde_json::to_string_pretty(c).map_err(|e| ConfigError::Parse(e.to_string()))?;
        s.push('\n');
        Ok(s)
    } else {
        toml::to_string_pretty(c).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

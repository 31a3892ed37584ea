use std::fs;
use std::process;

use hime_core::config::parse_configuration_toml;
use hime_core::slide::GestureResolver;

use super::config_ops::die;

/// Print the on-key hint of every bound character in `file`.
pub fn slide_hints(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let c = die!(parse_configuration_toml(&content), "Error: {}");
    let resolver = GestureResolver::from_configuration(&c);
    let hints = resolver.table().display_hints();
    if hints.is_empty() {
        println!("(no slide bindings)");
        return;
    }
    let width = hints.keys().map(|k| k.chars().count()).max().unwrap_or(1);
    for (character, hint) in &hints {
        println!("{character:<width$}  {hint}");
    }
    println!("{} characters, {} bindings", hints.len(), resolver.table().len());
}

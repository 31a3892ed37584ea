fn main() {
    // Validate embedded TOML files at compile time.
    validate_toml(
        "src/config/default_configuration.toml",
        include_str!("src/config/default_configuration.toml"),
    );
}

fn validate_toml(path: &str, content: &str) {
    if content.parse::<toml::Value>().is_err() {
        panic!("{path} contains invalid TOML");
    }
}

use clap::{Parser, Subcommand};

use hime_cli::commands::{config_ops, slide_ops};

#[derive(Parser)]
#[command(name = "himetool", about = "Hime keyboard configuration tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Configuration documents
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Slide bindings
    Slide {
        #[command(subcommand)]
        action: SlideAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the built-in default configuration
    Export,
    /// Parse and validate a full configuration document
    Validate {
        /// Configuration TOML file
        file: String,
    },
    /// Print the effective configuration: default, then base, then patch
    Merge {
        /// Full configuration document (hamster.toml)
        base: String,
        /// Patch document (hamster.custom.toml)
        patch: String,
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SlideAction {
    /// Show the up/down hint of every bound key
    Hints {
        /// Configuration TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Config { action } => match action {
            ConfigAction::Export => config_ops::config_export(),
            ConfigAction::Validate { file } => config_ops::config_validate(&file),
            ConfigAction::Merge { base, patch, json } => {
                config_ops::config_merge(&base, &patch, json)
            }
        },
        Command::Slide { action } => match action {
            SlideAction::Hints { file } => slide_ops::slide_hints(&file),
        },
    }
}

//! Config command implementation.
//!
//! Shows, validates and lists engine configurations.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use convex_lattice::LatticeConfig;

use crate::cli::OutputFormat;
use crate::commands::load_config;
use crate::output::{print_error, print_header, print_output, print_success, KeyValue};

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Validate a configuration file
    Validate(ValidateArgs),

    /// List the built-in presets
    Presets,
}

/// Arguments for validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration file (TOML or JSON)
    pub path: PathBuf,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(config, format),
        ConfigCommand::Validate(args) => validate(&args.path),
        ConfigCommand::Presets => presets(format),
    }
}

fn rows(config: &LatticeConfig) -> Vec<KeyValue> {
    vec![
        KeyValue::new("name", config.name.clone()),
        KeyValue::new("description", config.description.clone().unwrap_or_default()),
        KeyValue::new("steps", config.steps.to_string()),
        KeyValue::new("snap_to_grid", config.snap_to_grid.to_string()),
    ]
}

fn show(config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Minimal => print!("{}", toml::to_string_pretty(config)?),
        OutputFormat::Table => {
            print_header("Engine Configuration");
            print_output(&rows(config), format)?;
        }
        OutputFormat::Csv => print_output(&rows(config), format)?,
    }
    Ok(())
}

fn validate(path: &std::path::Path) -> Result<()> {
    match load_config(Some(path)) {
        Ok(config) => {
            print_success(&format!("{} is valid ({} steps)", path.display(), config.steps));
            Ok(())
        }
        Err(e) => {
            print_error(&e.to_string());
            Err(e.into())
        }
    }
}

fn presets(format: OutputFormat) -> Result<()> {
    let presets = [LatticeConfig::default(), LatticeConfig::coarse(), LatticeConfig::fine()];
    let rows: Vec<KeyValue> = presets
        .iter()
        .map(|p| KeyValue::new(p.name.clone(), format!("{} steps", p.steps)))
        .collect();

    if format == OutputFormat::Table {
        print_header("Presets");
    }
    print_output(&rows, format)
}

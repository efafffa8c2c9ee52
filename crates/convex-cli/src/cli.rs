//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{BondArgs, ConfigArgs, ConvertibleArgs, OptionArgs, SwaptionArgs};

/// Convex Lattice - Backward-induction valuation on binomial trees
#[derive(Parser)]
#[command(name = "convex-lattice")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "CONVEX_LATTICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Value a vanilla equity option on a CRR binomial tree
    Option(OptionArgs),

    /// Value a zero-coupon bond on a Hull-White tree
    Bond(BondArgs),

    /// Value a European or Bermudan swaption on a Hull-White tree
    Swaption(SwaptionArgs),

    /// Value a convertible bond with the Tsiveriotis-Fernandes model
    Convertible(ConvertibleArgs),

    /// Inspect engine configurations
    Config(ConfigArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
    /// Minimal output (just the value)
    Minimal,
}

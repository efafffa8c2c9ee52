//! Convex Lattice CLI - Command-line interface for lattice valuation.
//!
//! # Usage
//!
//! ```bash
//! # American put on a binomial tree
//! convex-lattice option --type put --spot 100 --strike 100 --vol 0.2 --exercise american
//!
//! # Zero-coupon bond on a Hull-White tree
//! convex-lattice bond --maturity 5 --rate 0.03
//!
//! # Bermudan payer swaption
//! convex-lattice swaption --start 1 --maturity 5 --exercise bermudan
//!
//! # Callable convertible bond
//! convex-lattice convertible --spot 100 --coupon 4 --maturity 3 --call-price 120 --call-time 2
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;
    let format = cli.format;

    // Execute command
    match cli.command {
        Commands::Option(args) => commands::option::execute(args, &config, format)?,
        Commands::Bond(args) => commands::bond::execute(args, &config, format)?,
        Commands::Swaption(args) => commands::swaption::execute(args, &config, format)?,
        Commands::Convertible(args) => commands::convertible::execute(args, &config, format)?,
        Commands::Config(args) => commands::config::execute(args, &config, format)?,
    }

    Ok(())
}

/// Logs go to stderr so table, JSON and CSV output stay clean.
fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "convex_lattice=debug,warn",
        _ => "convex_lattice=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! Option command implementation.
//!
//! Values a vanilla call or put on a Cox-Ross-Rubinstein tree.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};

use convex_lattice::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_positive, validate_volatility, with_steps};
use crate::error::CliError;
use crate::output::{print_report, KeyValue};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Call option
    Call,
    /// Put option
    Put,
}

impl From<Kind> for OptionType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Call => OptionType::Call,
            Kind::Put => OptionType::Put,
        }
    }
}

/// Exercise style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// At maturity only
    European,
    /// Any time up to maturity
    American,
    /// On the dates given by --exercise-times
    Bermudan,
}

/// Arguments for the option command.
#[derive(Args, Debug)]
pub struct OptionArgs {
    /// Option type
    #[arg(long = "type", value_enum, default_value = "call")]
    pub kind: Kind,

    /// Spot price of the underlying
    #[arg(long)]
    pub spot: f64,

    /// Strike price
    #[arg(long)]
    pub strike: f64,

    /// Time to maturity in years
    #[arg(long, default_value = "1.0")]
    pub maturity: f64,

    /// Continuously compounded risk-free rate (decimal)
    #[arg(long, default_value = "0.05")]
    pub rate: f64,

    /// Continuous dividend yield (decimal)
    #[arg(long, default_value = "0.0")]
    pub dividend_yield: f64,

    /// Volatility (decimal)
    #[arg(long, default_value = "0.2")]
    pub vol: f64,

    /// Exercise style
    #[arg(long, value_enum, default_value = "european")]
    pub exercise: Style,

    /// Comma-separated exercise times in years for Bermudan exercise
    #[arg(long, value_delimiter = ',')]
    pub exercise_times: Vec<f64>,

    /// Tree steps (overrides the configuration)
    #[arg(long)]
    pub steps: Option<usize>,
}

/// Execute the option command.
pub fn execute(args: OptionArgs, config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    let spot = validate_positive("spot", args.spot)?;
    let strike = validate_positive("strike", args.strike)?;
    let maturity = validate_positive("maturity", args.maturity)?;
    let vol = validate_volatility(args.vol)?;

    let exercise = match args.exercise {
        Style::European => Exercise::european(maturity)?,
        Style::American => Exercise::american(0.0, maturity)?,
        Style::Bermudan => {
            if args.exercise_times.is_empty() {
                return Err(CliError::MissingArgument("--exercise-times".to_string()).into());
            }
            Exercise::bermudan(args.exercise_times.clone())?
        }
    };

    let config = with_steps(config, args.steps);
    let grid = build_uniform_grid(&[maturity], &config)?;
    let lattice: Arc<dyn Lattice> = Arc::new(BlackScholesLattice::new(
        spot,
        args.rate,
        args.dividend_yield,
        vol,
        grid,
    )?);

    let payoff = PlainVanillaPayoff::new(args.kind.into(), strike);
    let mut option = DiscretizedVanillaOption::new(payoff, exercise);
    let engine = RollbackEngine::new(config)?;
    let value = engine.price(&mut option, lattice)?;

    let results = vec![
        KeyValue::new("Option", format!("{} {}", option.exercise().exercise_type(), payoff.option_type)),
        KeyValue::number("Spot", spot, 4),
        KeyValue::number("Strike", strike, 4),
        KeyValue::number("Maturity", maturity, 4),
        KeyValue::percent("Rate", args.rate),
        KeyValue::percent("Dividend Yield", args.dividend_yield),
        KeyValue::percent("Volatility", vol),
        KeyValue::new("Steps", engine.config().steps.to_string()),
        KeyValue::separator(),
        KeyValue::number("Intrinsic", payoff.value(spot), 6),
        KeyValue::number("Value", value, 6),
    ];

    print_report("Option Valuation", &results, "Value", format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_conversion() {
        assert_eq!(OptionType::from(Kind::Call), OptionType::Call);
        assert_eq!(OptionType::from(Kind::Put), OptionType::Put);
    }
}

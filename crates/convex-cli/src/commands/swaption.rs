//! Swaption command implementation.
//!
//! Values a European or Bermudan swaption on a regular fixed-for-floating
//! swap using a Hull-White tree.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};

use convex_lattice::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_positive, validate_volatility, with_steps, CurveArgs};
use crate::error::CliError;
use crate::output::{print_report, KeyValue};

/// Payer or receiver of the fixed leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    /// Pay fixed, receive floating
    Payer,
    /// Receive fixed, pay floating
    Receiver,
}

impl From<Side> for SwapType {
    fn from(side: Side) -> Self {
        match side {
            Side::Payer => SwapType::Payer,
            Side::Receiver => SwapType::Receiver,
        }
    }
}

/// Swaption exercise style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// Exercise into the full swap at its start
    European,
    /// Exercise on every fixed reset date
    Bermudan,
}

/// Arguments for the swaption command.
#[derive(Args, Debug)]
pub struct SwaptionArgs {
    /// Swap side
    #[arg(long, value_enum, default_value = "payer")]
    pub side: Side,

    /// Notional
    #[arg(long, default_value = "100")]
    pub nominal: f64,

    /// Fixed rate (decimal); defaults to the forward par rate
    #[arg(long)]
    pub strike: Option<f64>,

    /// Swap start (first exercise) in years
    #[arg(long)]
    pub start: f64,

    /// Swap maturity in years
    #[arg(long)]
    pub maturity: f64,

    /// Fixed and floating payments per year
    #[arg(long, default_value = "1")]
    pub frequency: u32,

    /// Exercise style
    #[arg(long, value_enum, default_value = "bermudan")]
    pub exercise: Style,

    #[command(flatten)]
    pub curve: CurveArgs,

    /// Hull-White mean reversion speed
    #[arg(long, default_value = "0.1")]
    pub mean_reversion: f64,

    /// Hull-White short rate volatility (absolute, decimal)
    #[arg(long, default_value = "0.01")]
    pub sigma: f64,

    /// Tree steps (overrides the configuration)
    #[arg(long)]
    pub steps: Option<usize>,
}

/// Simply compounded forward par rate of a regular swap on `curve`.
fn forward_par_rate(curve: &CurveArgs, start: f64, maturity: f64, frequency: u32) -> f64 {
    let tau = 1.0 / f64::from(frequency);
    let periods = ((maturity - start) / tau).round() as usize;
    let annuity: f64 = (1..=periods)
        .map(|k| tau * curve.discount(start + k as f64 * tau))
        .sum();
    (curve.discount(start) - curve.discount(maturity)) / annuity
}

/// Execute the swaption command.
pub fn execute(args: SwaptionArgs, config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    let nominal = validate_positive("nominal", args.nominal)?;
    let sigma = validate_volatility(args.sigma)?;
    if args.frequency == 0 {
        return Err(CliError::invalid("frequency", 0.0, "Use 1, 2, 4 or 12.").into());
    }

    let curve = args.curve;
    let strike = args
        .strike
        .unwrap_or_else(|| forward_par_rate(&curve, args.start, args.maturity, args.frequency));

    let swap = DiscretizedSwap::regular(
        args.side.into(),
        nominal,
        strike,
        args.start,
        args.maturity,
        args.frequency,
    )?;

    let exercise = match args.exercise {
        Style::European => Exercise::european(args.start)?,
        Style::Bermudan => Exercise::bermudan(swap.arguments().fixed_reset_times.clone())?,
    };
    let exercise_type = exercise.exercise_type();
    let exercise_dates = exercise.times().len();

    let config = with_steps(config, args.steps);
    let grid = build_uniform_grid(&[args.maturity], &config)?;
    let model = HullWhite::new(args.mean_reversion, sigma)?;
    let lattice: Arc<dyn Lattice> = Arc::new(model.build_tree(&|t| curve.zero_rate(t), grid)?);

    let engine = RollbackEngine::new(config)?;
    let mut swaption = DiscretizedOption::new(swap, exercise);
    let value = engine.price(&mut swaption, lattice)?;

    let results = vec![
        KeyValue::new("Swaption", format!("{exercise_type} {:?}", args.side)),
        KeyValue::number("Nominal", nominal, 2),
        KeyValue::percent("Strike", strike),
        KeyValue::number("Start", args.start, 4),
        KeyValue::number("Maturity", args.maturity, 4),
        KeyValue::new("Exercise Dates", exercise_dates.to_string()),
        KeyValue::number("Mean Reversion", args.mean_reversion, 4),
        KeyValue::percent("Sigma", sigma),
        KeyValue::new("Steps", engine.config().steps.to_string()),
        KeyValue::separator(),
        KeyValue::number("Value", value, 6),
    ];

    print_report("Swaption Valuation", &results, "Value", format)
}

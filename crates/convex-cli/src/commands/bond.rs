//! Bond command implementation.
//!
//! Values a zero-coupon bond on a Hull-White tree fitted to a linear zero
//! curve and compares it with the curve discount factor.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use convex_lattice::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_positive, validate_volatility, with_steps, CurveArgs};
use crate::output::{print_report, KeyValue};

/// Arguments for the bond command.
#[derive(Args, Debug)]
pub struct BondArgs {
    /// Maturity in years
    #[arg(long)]
    pub maturity: f64,

    /// Face value
    #[arg(long, default_value = "100")]
    pub face: f64,

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

/// Execute the bond command.
pub fn execute(args: BondArgs, config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    let maturity = validate_positive("maturity", args.maturity)?;
    let face = validate_positive("face", args.face)?;
    let sigma = validate_volatility(args.sigma)?;

    let config = with_steps(config, args.steps);
    let grid = build_uniform_grid(&[maturity], &config)?;
    let model = HullWhite::new(args.mean_reversion, sigma)?;
    let curve = args.curve;
    let lattice: Arc<dyn Lattice> = Arc::new(model.build_tree(&|t| curve.zero_rate(t), grid)?);

    let mut bond = DiscretizedDiscountBond::new(maturity);
    let engine = RollbackEngine::new(config)?;
    let tree_df = engine.price(&mut bond, lattice)?;
    let curve_df = curve.discount(maturity);

    let results = vec![
        KeyValue::new("Model", model.name()),
        KeyValue::number("Mean Reversion", args.mean_reversion, 4),
        KeyValue::percent("Sigma", sigma),
        KeyValue::number("Maturity", maturity, 4),
        KeyValue::percent("Zero Rate", curve.zero_rate(maturity)),
        KeyValue::new("Steps", engine.config().steps.to_string()),
        KeyValue::separator(),
        KeyValue::number("Tree Discount Factor", tree_df, 10),
        KeyValue::number("Curve Discount Factor", curve_df, 10),
        KeyValue::number("Fit Error", tree_df - curve_df, 12),
        KeyValue::number("Price", face * tree_df, 6),
    ];

    print_report("Zero-Coupon Bond", &results, "Price", format)
}

//! Convertible command implementation.
//!
//! Values a convertible bond on a CRR tree with credit-adjusted discounting,
//! optional issuer call, holder put and regular coupons.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use convex_lattice::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_positive, validate_volatility, with_steps};
use crate::error::CliError;
use crate::output::{print_report, KeyValue};

/// Arguments for the convertible command.
#[derive(Args, Debug)]
pub struct ConvertibleArgs {
    /// Spot price of the underlying share
    #[arg(long)]
    pub spot: f64,

    /// Shares received per bond on conversion
    #[arg(long, default_value = "1.0")]
    pub conversion_ratio: f64,

    /// Redemption amount at maturity
    #[arg(long, default_value = "100")]
    pub redemption: f64,

    /// Coupon amount paid per period
    #[arg(long, default_value = "0.0")]
    pub coupon: f64,

    /// Coupon payments per year
    #[arg(long, default_value = "1")]
    pub frequency: u32,

    /// Maturity in years
    #[arg(long)]
    pub maturity: f64,

    /// Continuously compounded risk-free rate (decimal)
    #[arg(long, default_value = "0.05")]
    pub rate: f64,

    /// Issuer credit spread (decimal)
    #[arg(long, default_value = "0.02")]
    pub credit_spread: f64,

    /// Continuous dividend yield of the share (decimal)
    #[arg(long, default_value = "0.0")]
    pub dividend_yield: f64,

    /// Share volatility (decimal)
    #[arg(long, default_value = "0.3")]
    pub vol: f64,

    /// Issuer call price
    #[arg(long, requires = "call_time")]
    pub call_price: Option<f64>,

    /// Issuer call time in years
    #[arg(long, requires = "call_price")]
    pub call_time: Option<f64>,

    /// Soft-call trigger as a fraction of the call price (e.g. 1.3)
    #[arg(long, requires = "call_price")]
    pub call_trigger: Option<f64>,

    /// Holder put price
    #[arg(long, requires = "put_time")]
    pub put_price: Option<f64>,

    /// Holder put time in years
    #[arg(long, requires = "put_price")]
    pub put_time: Option<f64>,

    /// Tree steps (overrides the configuration)
    #[arg(long)]
    pub steps: Option<usize>,
}

impl ConvertibleArgs {
    fn coupons(&self) -> Vec<CashFlow> {
        if self.coupon == 0.0 || self.frequency == 0 {
            return Vec::new();
        }
        let tau = 1.0 / f64::from(self.frequency);
        let periods = (self.maturity / tau).round() as usize;
        (1..=periods)
            .map(|k| CashFlow {
                time: (k as f64 * tau).min(self.maturity),
                amount: self.coupon,
            })
            .collect()
    }

    fn callabilities(&self) -> Vec<CallabilitySchedule> {
        let call = self
            .call_price
            .zip(self.call_time)
            .map(|(price, time)| CallabilitySchedule {
                time,
                price,
                kind: CallabilityKind::Call,
                trigger: self.call_trigger,
            });
        let put = self
            .put_price
            .zip(self.put_time)
            .map(|(price, time)| CallabilitySchedule {
                time,
                price,
                kind: CallabilityKind::Put,
                trigger: None,
            });
        call.into_iter().chain(put).collect()
    }

    fn arguments(&self) -> Result<ConvertibleArguments> {
        Ok(ConvertibleArguments {
            redemption: self.redemption,
            conversion_ratio: self.conversion_ratio,
            credit_spread: self.credit_spread,
            risk_free_rate: self.rate,
            exercise: Exercise::american(0.0, self.maturity)?,
            callabilities: self.callabilities(),
            coupons: self.coupons(),
            dividends: Vec::new(),
        })
    }
}

/// Execute the convertible command.
pub fn execute(args: ConvertibleArgs, config: &LatticeConfig, format: OutputFormat) -> Result<()> {
    let spot = validate_positive("spot", args.spot)?;
    let maturity = validate_positive("maturity", args.maturity)?;
    let vol = validate_volatility(args.vol)?;
    validate_positive("conversion ratio", args.conversion_ratio)?;
    if args.frequency == 0 && args.coupon != 0.0 {
        return Err(CliError::invalid("frequency", 0.0, "Coupons need at least one payment per year.").into());
    }

    let arguments = args.arguments()?;
    let straight = straight_bond(&arguments);
    let conversion_value = spot * arguments.conversion_ratio;

    let config = with_steps(config, args.steps);
    let grid = build_uniform_grid(&[maturity], &config)?;
    let lattice: Arc<dyn Lattice> = Arc::new(BlackScholesLattice::new(
        spot,
        args.rate,
        args.dividend_yield,
        vol,
        grid,
    )?);

    let engine = RollbackEngine::new(config)?;
    let mut bond = DiscretizedConvertible::new(arguments)?;
    let value = engine.price(&mut bond, lattice)?;
    let conversion_probability = bond.conversion_probability().first().copied().unwrap_or(0.0);

    let results = vec![
        KeyValue::number("Spot", spot, 4),
        KeyValue::number("Conversion Ratio", args.conversion_ratio, 4),
        KeyValue::number("Redemption", args.redemption, 4),
        KeyValue::number("Maturity", maturity, 4),
        KeyValue::percent("Rate", args.rate),
        KeyValue::percent("Credit Spread", args.credit_spread),
        KeyValue::percent("Volatility", vol),
        KeyValue::new("Steps", engine.config().steps.to_string()),
        KeyValue::separator(),
        KeyValue::number("Conversion Value", conversion_value, 6),
        KeyValue::number("Straight Bond", straight, 6),
        KeyValue::number("Conversion Probability", conversion_probability, 4),
        KeyValue::number("Value", value, 6),
    ];

    print_report("Convertible Valuation", &results, "Value", format)
}

/// Coupons and redemption discounted at the credit-adjusted rate.
fn straight_bond(arguments: &ConvertibleArguments) -> f64 {
    let rate = arguments.risk_free_rate + arguments.credit_spread;
    let maturity = arguments.exercise.last_time().unwrap_or(0.0);
    let coupons: f64 = arguments
        .coupons
        .iter()
        .map(|c| c.amount * (-rate * c.time).exp())
        .sum();
    coupons + arguments.redemption * (-rate * maturity).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ConvertibleArgs,
    }

    fn parse(extra: &[&str]) -> ConvertibleArgs {
        let mut argv = vec!["test", "--spot", "100", "--maturity", "2", "--coupon", "2", "--frequency", "2"];
        argv.extend_from_slice(extra);
        Harness::parse_from(argv).args
    }

    #[test]
    fn test_coupon_schedule() {
        let coupons = parse(&[]).coupons();
        let times: Vec<f64> = coupons.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![0.5, 1.0, 1.5, 2.0]);
        assert!(coupons.iter().all(|c| c.amount == 2.0));
    }

    #[test]
    fn test_callabilities() {
        let args = parse(&["--call-price", "110", "--call-time", "1", "--put-price", "95", "--put-time", "1.5"]);
        let schedule = args.callabilities();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].kind, CallabilityKind::Call);
        assert_eq!(schedule[1].kind, CallabilityKind::Put);
        assert!(schedule[0].trigger.is_none());
    }

    #[test]
    fn test_straight_bond() {
        let arguments = parse(&["--rate", "0.03", "--credit-spread", "0.01"]).arguments().unwrap();
        let df = |t: f64| (-0.04 * t).exp();
        let expected = 2.0 * (df(0.5) + df(1.0) + df(1.5) + df(2.0)) + 100.0 * df(2.0);
        assert!((straight_bond(&arguments) - expected).abs() < 1e-12);
    }
}

//! Integration tests against closed-form reference values.
//!
//! Each test builds a lattice, runs the rollback engine end to end, and
//! compares the result with an analytic price or a no-arbitrage bound.

use std::sync::Arc;

use approx::assert_relative_eq;
use convex_lattice::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};

// =============================================================================
// HELPERS
// =============================================================================

const SPOT: f64 = 100.0;
const STRIKE: f64 = 100.0;
const RATE: f64 = 0.05;
const VOL: f64 = 0.2;

fn black_scholes(option_type: OptionType, spot: f64, strike: f64, rate: f64, vol: f64, t: f64) -> f64 {
    let n = Normal::new(0.0, 1.0).unwrap();
    let d1 = ((spot / strike).ln() + (rate + 0.5 * vol * vol) * t) / (vol * t.sqrt());
    let d2 = d1 - vol * t.sqrt();
    let df = (-rate * t).exp();
    match option_type {
        OptionType::Call => spot * n.cdf(d1) - strike * df * n.cdf(d2),
        OptionType::Put => strike * df * n.cdf(-d2) - spot * n.cdf(-d1),
    }
}

fn equity_tree(steps: usize, maturity: f64) -> (RollbackEngine, Arc<dyn Lattice>) {
    let config = LatticeConfig::default().with_steps(steps);
    let grid = build_uniform_grid(&[maturity], &config).unwrap();
    let lattice: Arc<dyn Lattice> =
        Arc::new(BlackScholesLattice::new(SPOT, RATE, 0.0, VOL, grid).unwrap());
    (RollbackEngine::new(config).unwrap(), lattice)
}

fn vanilla(option_type: OptionType, exercise: Exercise) -> DiscretizedVanillaOption {
    DiscretizedVanillaOption::new(PlainVanillaPayoff::new(option_type, STRIKE), exercise)
}

fn sloped_curve(t: f64) -> f64 {
    0.03 + 0.004 * t
}

fn hull_white_tree(maturity: f64, steps: usize) -> (RollbackEngine, Arc<dyn Lattice>) {
    let config = LatticeConfig::default().with_steps(steps);
    let grid = build_uniform_grid(&[maturity], &config).unwrap();
    let model = HullWhite::new(0.1, 0.01).unwrap();
    let tree = model.build_tree(&sloped_curve, grid).unwrap();
    (RollbackEngine::new(config).unwrap(), Arc::new(tree))
}

fn curve_discount(t: f64) -> f64 {
    (-sloped_curve(t) * t).exp()
}

/// Simply compounded forward par rate of an annual swap on the sloped curve.
fn forward_par_rate(start: f64, maturity: f64) -> f64 {
    let periods = (maturity - start).round() as usize;
    let annuity: f64 = (1..=periods).map(|k| curve_discount(start + k as f64)).sum();
    (curve_discount(start) - curve_discount(maturity)) / annuity
}

// =============================================================================
// EQUITY OPTIONS
// =============================================================================

#[test]
fn test_european_call_converges_to_black_scholes() {
    let (engine, lattice) = equity_tree(500, 1.0);
    let mut call = vanilla(OptionType::Call, Exercise::european(1.0).unwrap());
    let value = engine.price(&mut call, lattice).unwrap();

    let expected = black_scholes(OptionType::Call, SPOT, STRIKE, RATE, VOL, 1.0);
    assert!((value - expected).abs() < 0.02, "tree {value} vs analytic {expected}");
}

#[test]
fn test_put_call_parity_on_tree() {
    let (engine, lattice) = equity_tree(200, 1.0);
    let mut call = vanilla(OptionType::Call, Exercise::european(1.0).unwrap());
    let mut put = vanilla(OptionType::Put, Exercise::european(1.0).unwrap());

    let c = engine.price(&mut call, Arc::clone(&lattice)).unwrap();
    let p = engine.price(&mut put, lattice).unwrap();

    assert_relative_eq!(c - p, SPOT - STRIKE * (-RATE).exp(), epsilon = 1e-8);
}

#[test]
fn test_american_put_early_exercise_premium() {
    let (engine, lattice) = equity_tree(200, 1.0);
    let mut american = vanilla(OptionType::Put, Exercise::american(0.0, 1.0).unwrap());
    let mut european = vanilla(OptionType::Put, Exercise::european(1.0).unwrap());

    let a = engine.price(&mut american, Arc::clone(&lattice)).unwrap();
    let e = engine.price(&mut european, lattice).unwrap();

    assert!(a > e + 0.1, "american {a} should carry a premium over european {e}");
    assert!(a > 5.9 && a < 6.2, "american put {a}");
}

#[test]
fn test_bermudan_put_between_european_and_american() {
    let (engine, lattice) = equity_tree(200, 1.0);
    let quarterly = Exercise::bermudan(vec![0.25, 0.5, 0.75, 1.0]).unwrap();

    let e = engine
        .price(&mut vanilla(OptionType::Put, Exercise::european(1.0).unwrap()), Arc::clone(&lattice))
        .unwrap();
    let b = engine
        .price(&mut vanilla(OptionType::Put, quarterly), Arc::clone(&lattice))
        .unwrap();
    let a = engine
        .price(&mut vanilla(OptionType::Put, Exercise::american(0.0, 1.0).unwrap()), lattice)
        .unwrap();

    assert!(e <= b + 1e-12);
    assert!(b <= a + 1e-12);
}

#[test]
fn test_deep_itm_american_put_worth_intrinsic() {
    let config = LatticeConfig::default().with_steps(100);
    let grid = build_uniform_grid(&[1.0], &config).unwrap();
    let lattice: Arc<dyn Lattice> =
        Arc::new(BlackScholesLattice::new(40.0, RATE, 0.0, VOL, grid).unwrap());
    let engine = RollbackEngine::new(config).unwrap();

    let mut put = vanilla(OptionType::Put, Exercise::american(0.0, 1.0).unwrap());
    let value = engine.price(&mut put, lattice).unwrap();
    assert_relative_eq!(value, STRIKE - 40.0, epsilon = 1e-10);
}

#[test]
fn test_single_bermudan_date_is_european() {
    let config = LatticeConfig::default().with_steps(50);
    let grid = build_uniform_grid(&[1.0], &config).unwrap();
    // A high dividend yield makes early exercise of the call valuable
    let lattice: Arc<dyn Lattice> =
        Arc::new(BlackScholesLattice::new(120.0, RATE, 0.1, VOL, grid).unwrap());
    let engine = RollbackEngine::new(config).unwrap();

    let mut values: Vec<f64> = lattice
        .grid(1.0)
        .unwrap()
        .iter()
        .map(|s| (s - STRIKE).max(0.0))
        .collect();
    for i in (0..lattice.time_grid().steps()).rev() {
        values = lattice.step_back(i, &values).unwrap();
    }
    let discounted = values[0];

    let mut bermudan = vanilla(OptionType::Call, Exercise::bermudan(vec![1.0]).unwrap());
    let mut american = vanilla(OptionType::Call, Exercise::american(0.0, 1.0).unwrap());
    let bermudan = engine.price(&mut bermudan, Arc::clone(&lattice)).unwrap();
    let american = engine.price(&mut american, lattice).unwrap();

    assert_relative_eq!(bermudan, discounted, epsilon = 1e-10);
    assert!(american > bermudan + 1e-3);
}

#[test]
fn test_american_put_nodes_stay_above_intrinsic() {
    let (_, lattice) = equity_tree(100, 1.0);
    let grid = lattice.time_grid().clone();

    let mut put = vanilla(OptionType::Put, Exercise::american(0.0, 1.0).unwrap());
    put.initialize(Arc::clone(&lattice), 1.0).unwrap();

    for i in (0..=grid.steps()).rev() {
        let t = grid.at(i);
        put.rollback(t).unwrap();
        let spots = lattice.grid(t).unwrap();
        for (value, spot) in put.values().iter().zip(&spots) {
            let intrinsic = (STRIKE - spot).max(0.0);
            assert!(*value >= intrinsic - 1e-12, "t = {t}: {value} < {intrinsic}");
        }
    }
}

// =============================================================================
// INTEREST RATE INSTRUMENTS
// =============================================================================

#[test]
fn test_hull_white_reprices_discount_bonds() {
    let (engine, lattice) = hull_white_tree(5.0, 100);

    for maturity in [1.0, 2.5, 5.0] {
        let mut bond = DiscretizedDiscountBond::new(maturity);
        let value = engine.price(&mut bond, Arc::clone(&lattice)).unwrap();
        assert_relative_eq!(value, curve_discount(maturity), epsilon = 1e-8);
    }
}

#[test]
fn test_deterministic_lattice_matches_curve() {
    let config = LatticeConfig::default().with_steps(40);
    let grid = build_time_grid(&[0.7, 3.3], &config).unwrap();
    let lattice: Arc<dyn Lattice> =
        Arc::new(DeterministicLattice::from_zero_rates(grid, &sloped_curve));
    let engine = RollbackEngine::new(config).unwrap();

    let mut bond = DiscretizedDiscountBond::new(3.3);
    let value = engine.price(&mut bond, lattice).unwrap();
    assert_relative_eq!(value, curve_discount(3.3), epsilon = 1e-10);
}

#[test]
fn test_par_swap_on_hull_white_tree() {
    let (engine, lattice) = hull_white_tree(5.0, 100);
    let rate = forward_par_rate(0.0, 5.0);

    let mut swap = DiscretizedSwap::regular(SwapType::Payer, 1.0, rate, 0.0, 5.0, 1).unwrap();
    let value = engine.price(&mut swap, lattice).unwrap();
    assert!(value.abs() < 1e-8, "par swap value {value}");
}

#[test]
fn test_bermudan_swaption_dominates_european() {
    let (engine, lattice) = hull_white_tree(5.0, 100);
    let rate = forward_par_rate(1.0, 5.0);
    let swap = || DiscretizedSwap::regular(SwapType::Payer, 100.0, rate, 1.0, 5.0, 1).unwrap();

    let mut european = DiscretizedOption::new(swap(), Exercise::european(1.0).unwrap());
    let mut bermudan = DiscretizedOption::new(
        swap(),
        Exercise::bermudan(vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
    );

    let e = engine.price(&mut european, Arc::clone(&lattice)).unwrap();
    let b = engine.price(&mut bermudan, lattice).unwrap();

    assert!(e > 0.0, "ATM swaption must have time value, got {e}");
    assert!(b >= e - 1e-12, "bermudan {b} below european {e}");
}

// =============================================================================
// CONVERTIBLES
// =============================================================================

fn convertible_arguments() -> ConvertibleArguments {
    ConvertibleArguments {
        redemption: 100.0,
        conversion_ratio: 1.0,
        credit_spread: 0.02,
        risk_free_rate: RATE,
        exercise: Exercise::american(0.0, 3.0).unwrap(),
        callabilities: vec![CallabilitySchedule {
            time: 2.0,
            price: 120.0,
            kind: CallabilityKind::Call,
            trigger: None,
        }],
        coupons: (1..=3)
            .map(|k| CashFlow { time: f64::from(k), amount: 3.0 })
            .collect(),
        dividends: vec![CashFlow { time: 1.5, amount: 1.0 }],
    }
}

#[test]
fn test_convertible_bounds_through_engine() {
    let (engine, lattice) = equity_tree(300, 3.0);
    let mut bond = DiscretizedConvertible::new(convertible_arguments()).unwrap();
    let value = engine.price(&mut bond, lattice).unwrap();

    let risky = |t: f64| (-(RATE + 0.02) * t).exp();
    let straight = 3.0 * risky(1.0) + 3.0 * risky(2.0) + 103.0 * risky(3.0);

    assert!(value >= SPOT - 1e-9, "convertible {value} below parity");
    assert!(value >= straight - 1e-9, "convertible {value} below straight bond {straight}");
    assert!(value < SPOT + straight, "convertible {value} implausibly rich");
}

// =============================================================================
// ERROR PATHS
// =============================================================================

#[test]
fn test_exercise_beyond_grid_is_rejected() {
    let (engine, lattice) = equity_tree(50, 1.0);
    let mut put = vanilla(OptionType::Put, Exercise::european(2.0).unwrap());

    let err = engine.price(&mut put, lattice).unwrap_err();
    assert!(matches!(err, LatticeError::InvalidInput { .. }));
}

#[test]
fn test_option_on_foreign_lattice_is_rejected() {
    let (_, first) = equity_tree(50, 1.0);
    let (_, second) = equity_tree(50, 1.0);

    let mut bond = DiscretizedDiscountBond::new(1.0);
    bond.initialize(first, 1.0).unwrap();

    let mut option = DiscretizedOption::new(bond, Exercise::european(1.0).unwrap());
    let err = option.initialize(second, 1.0).unwrap_err();
    assert!(matches!(err, LatticeError::Consistency { .. }));
}

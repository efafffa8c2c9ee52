//! Hull-White one-factor short rate model.
//!
//! The Hull-White model is defined by:
//!
//! ```text
//! dr = (θ(t) - a*r)dt + σ*dW
//! ```
//!
//! Where:
//! - `a` = mean reversion speed
//! - `σ` = volatility
//! - `θ(t)` = time-dependent drift calibrated to fit the yield curve
//!
//! # Tree construction
//!
//! The short rate is split as `r = x + α(t)`, where `x` follows the driftless
//! mean-reverting process `dx = -a*x*dt + σ*dW` with `x(0) = 0`. `x` lives on a
//! recombining binomial lattice with node values `(2j - i) * σ * sqrt(dt)` and
//! state-dependent up probabilities matching the mean reversion drift. The
//! shifts `α(t_i)` are then solved for one step at a time by forward induction
//! on Arrow-Debreu prices, so the tree reprices every discount factor on the
//! grid exactly.

use tracing::debug;

use super::{ModelError, ShortRateModel};
use crate::error::LatticeResult;
use crate::lattice::ShortRateTree;
use crate::time_grid::TimeGrid;

/// Hull-White one-factor short rate model.
///
/// # Example
///
/// ```rust
/// use convex_lattice::models::{HullWhite, ShortRateModel};
/// use convex_lattice::{Lattice, TimeGrid};
///
/// let model = HullWhite::new(0.03, 0.01).unwrap(); // 3% mean reversion, 1% vol
/// let grid = TimeGrid::uniform(5.0, 50).unwrap();
/// let tree = model.build_tree(&|_t| 0.04, grid).unwrap();
/// assert_eq!(tree.size(50), 51);
/// ```
///
/// # Parameters
///
/// - **Mean Reversion (a)**: Speed at which rates revert to long-term level.
///   Typical values: 0.01 - 0.10 (1% to 10% per year).
///
/// - **Volatility (σ)**: Instantaneous volatility of the short rate.
///   Typical values: 0.005 - 0.02 (50 to 200 bps annualized).
#[derive(Debug, Clone)]
pub struct HullWhite {
    /// Mean reversion speed (a).
    mean_reversion: f64,

    /// Short rate volatility (σ).
    volatility: f64,
}

impl HullWhite {
    /// Creates a new Hull-White model with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidParameter`] for a negative or non-finite
    /// mean reversion or volatility.
    pub fn new(mean_reversion: f64, volatility: f64) -> Result<Self, ModelError> {
        if !mean_reversion.is_finite() || mean_reversion < 0.0 {
            return Err(ModelError::invalid_parameter(
                "mean_reversion",
                mean_reversion,
            ));
        }
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(ModelError::invalid_parameter("volatility", volatility));
        }

        Ok(Self {
            mean_reversion,
            volatility,
        })
    }

    /// Creates a Hull-White model with default parameters.
    ///
    /// Uses mean reversion = 3%, volatility = 1%.
    #[must_use]
    pub fn default_params() -> Self {
        Self {
            mean_reversion: 0.03,
            volatility: 0.01,
        }
    }

    /// Up-move probability at a node with deviation `x`.
    fn prob_up(&self, x: f64, dt: f64) -> f64 {
        if self.volatility == 0.0 {
            return 0.5;
        }
        (0.5 - self.mean_reversion * x * dt.sqrt() / (2.0 * self.volatility)).clamp(0.0, 1.0)
    }
}

impl ShortRateModel for HullWhite {
    fn build_tree(
        &self,
        zero_rates: &dyn Fn(f64) -> f64,
        grid: TimeGrid,
    ) -> LatticeResult<ShortRateTree> {
        let mut tree = ShortRateTree::new(grid)?;
        let steps = tree.steps();
        let dt = tree.dt();
        let dx = self.volatility * dt.sqrt();
        let x = |i: usize, j: usize| (2.0 * j as f64 - i as f64) * dx;

        // Arrow-Debreu prices of the nodes at the current step
        let mut state_prices = vec![1.0];
        let mut alpha = 0.0;

        for i in 0..steps {
            let t_next = tree.time_at_step(i + 1);
            let target = (-zero_rates(t_next) * t_next).exp();

            let unshifted: f64 = state_prices
                .iter()
                .enumerate()
                .map(|(j, q)| q * (-x(i, j) * dt).exp())
                .sum();
            if !(unshifted > 0.0 && target > 0.0) {
                return Err(ModelError::tree_construction_failed(format!(
                    "cannot fit discount factor {target} at t = {t_next}"
                ))
                .into());
            }
            alpha = (unshifted / target).ln() / dt;

            let mut next_prices = vec![0.0; i + 2];
            for (j, q) in state_prices.iter().enumerate() {
                let rate = x(i, j) + alpha;
                tree.set_rate(i, j, rate);

                let p_up = self.prob_up(x(i, j), dt);
                tree.set_probabilities(i, j, p_up, 1.0 - p_up)?;

                let discounted = q * (-rate * dt).exp();
                next_prices[j] += (1.0 - p_up) * discounted;
                next_prices[j + 1] += p_up * discounted;
            }
            state_prices = next_prices;
        }

        // The last level only carries state; reuse the final shift
        for j in 0..=steps {
            tree.set_rate(steps, j, x(steps, j) + alpha);
        }

        debug!(
            model = self.name(),
            steps,
            dt,
            short_rate = tree.rate_at(0, 0),
            "built short rate tree"
        );

        Ok(tree)
    }

    fn volatility(&self, _t: f64) -> f64 {
        // Constant volatility in standard Hull-White
        self.volatility
    }

    fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    fn name(&self) -> &'static str {
        "Hull-White"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Lattice;
    use approx::assert_relative_eq;

    /// Rolls a unit payoff at the grid end back to time 0.
    fn zero_coupon(tree: &ShortRateTree) -> f64 {
        let steps = tree.steps();
        let mut values = vec![1.0; steps + 1];
        for i in (0..steps).rev() {
            values = tree.step_back(i, &values).unwrap();
        }
        values[0]
    }

    #[test]
    fn test_hull_white_creation() {
        let model = HullWhite::new(0.03, 0.01).unwrap();
        assert!((model.mean_reversion() - 0.03).abs() < 1e-10);
        assert!((model.volatility(5.0) - 0.01).abs() < 1e-10);
        assert_eq!(model.name(), "Hull-White");
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            HullWhite::new(0.03, -0.01),
            Err(ModelError::InvalidParameter {
                name: "volatility",
                ..
            })
        ));
        assert!(HullWhite::new(f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_default_params() {
        let model = HullWhite::default_params();
        assert!((model.mean_reversion() - 0.03).abs() < 1e-10);
        assert!((model.volatility(0.0) - 0.01).abs() < 1e-10);
    }

    #[test]
    fn test_flat_curve_is_repriced() {
        let model = HullWhite::new(0.05, 0.01).unwrap();
        let grid = TimeGrid::uniform(4.0, 40).unwrap();
        let tree = model.build_tree(&|_t| 0.05, grid).unwrap();

        assert_relative_eq!(zero_coupon(&tree), (-0.2_f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(tree.rate_at(0, 0), 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_sloped_curve_is_repriced() {
        let model = HullWhite::new(0.1, 0.015).unwrap();
        let curve = |t: f64| 0.02 + 0.005 * t;

        for maturity in [1.0, 3.0, 7.0] {
            let grid = TimeGrid::uniform(maturity, 35).unwrap();
            let tree = model.build_tree(&curve, grid).unwrap();
            let expected = (-curve(maturity) * maturity).exp();
            assert_relative_eq!(zero_coupon(&tree), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mean_reversion_tilts_probabilities() {
        let model = HullWhite::new(0.1, 0.01).unwrap();
        let grid = TimeGrid::uniform(2.0, 8).unwrap();
        let tree = model.build_tree(&|_t| 0.03, grid).unwrap();

        // Above the centre the process is pulled down, below it up
        assert!(tree.prob_up(4, 4) < 0.5);
        assert!(tree.prob_up(4, 0) > 0.5);
        assert_relative_eq!(tree.prob_up(4, 2), 0.5, epsilon = 1e-12);
        assert_relative_eq!(tree.prob_up(4, 4) + tree.prob_down(4, 4), 1.0);
        assert!(tree.rate_at(8, 8) > tree.rate_at(8, 0));
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        let model = HullWhite::new(0.03, 0.0).unwrap();
        let grid = TimeGrid::uniform(1.0, 4).unwrap();
        let tree = model.build_tree(&|_t| 0.04, grid).unwrap();

        assert_relative_eq!(tree.rate_at(3, 0), tree.rate_at(3, 3), epsilon = 1e-12);
        assert_relative_eq!(zero_coupon(&tree), (-0.04_f64).exp(), epsilon = 1e-12);
    }
}

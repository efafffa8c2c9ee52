//! Cox-Ross-Rubinstein binomial tree for an equity spot price.

use super::{require_uniform, Lattice};
use crate::error::{LatticeError, LatticeResult};
use crate::time_grid::TimeGrid;

/// Recombining binomial tree on a lognormal spot price.
///
/// Node `j` at step `i` carries `S0 * u^j * d^(i - j)` with `u = exp(sigma * sqrt(dt))`
/// and `d = 1 / u`, so there are `i + 1` nodes at step `i`. Branch 0 is the
/// down move and branch 1 the up move. Discounting is at the flat risk-free
/// rate.
///
/// # Example
///
/// ```rust
/// use convex_lattice::{BlackScholesLattice, Lattice, TimeGrid};
///
/// let grid = TimeGrid::uniform(1.0, 100).unwrap();
/// let tree = BlackScholesLattice::new(100.0, 0.05, 0.0, 0.2, grid).unwrap();
/// assert_eq!(tree.size(100), 101);
/// ```
#[derive(Debug, Clone)]
pub struct BlackScholesLattice {
    grid: TimeGrid,
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    volatility: f64,
    up: f64,
    down: f64,
    prob_up: f64,
    step_discount: f64,
}

impl BlackScholesLattice {
    /// Builds the tree on a uniform grid.
    ///
    /// # Arguments
    ///
    /// * `spot` - Spot price at time 0
    /// * `rate` - Continuously compounded risk-free rate
    /// * `dividend_yield` - Continuously compounded dividend yield
    /// * `volatility` - Lognormal volatility (annualized)
    /// * `grid` - Uniform time grid
    ///
    /// # Errors
    ///
    /// Fails on a non-positive spot or volatility, a non-uniform grid, or a
    /// step so coarse that the risk-neutral probability leaves `[0, 1]`.
    pub fn new(
        spot: f64,
        rate: f64,
        dividend_yield: f64,
        volatility: f64,
        grid: TimeGrid,
    ) -> LatticeResult<Self> {
        if !(spot > 0.0 && spot.is_finite()) {
            return Err(LatticeError::invalid_input(format!(
                "spot must be positive, got {spot}"
            )));
        }
        if !(volatility > 0.0 && volatility.is_finite()) {
            return Err(LatticeError::invalid_input(format!(
                "volatility must be positive, got {volatility}"
            )));
        }

        let dt = require_uniform(&grid, "binomial tree")?;
        let up = (volatility * dt.sqrt()).exp();
        let down = 1.0 / up;
        let growth = ((rate - dividend_yield) * dt).exp();
        let prob_up = (growth - down) / (up - down);

        if !(0.0..=1.0).contains(&prob_up) {
            return Err(LatticeError::invalid_input(format!(
                "risk-neutral probability {prob_up:.6} outside [0, 1]; use more time steps"
            )));
        }

        Ok(Self {
            grid,
            spot,
            rate,
            dividend_yield,
            volatility,
            up,
            down,
            prob_up,
            step_discount: (-rate * dt).exp(),
        })
    }

    /// Spot price at time 0.
    #[must_use]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Risk-free rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Dividend yield.
    #[must_use]
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }

    /// Volatility.
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Up-move probability.
    #[must_use]
    pub fn prob_up(&self) -> f64 {
        self.prob_up
    }
}

impl Lattice for BlackScholesLattice {
    fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    fn size(&self, i: usize) -> usize {
        i + 1
    }

    fn branches(&self) -> usize {
        2
    }

    fn descendant(&self, _i: usize, index: usize, branch: usize) -> usize {
        index + branch
    }

    fn probability(&self, _i: usize, _index: usize, branch: usize) -> f64 {
        if branch == 1 {
            self.prob_up
        } else {
            1.0 - self.prob_up
        }
    }

    fn discount(&self, _i: usize, _index: usize) -> f64 {
        self.step_discount
    }

    fn underlying(&self, i: usize, index: usize) -> f64 {
        self.spot * self.up.powi(index as i32) * self.down.powi((i - index) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tree(steps: usize) -> BlackScholesLattice {
        let grid = TimeGrid::uniform(1.0, steps).unwrap();
        BlackScholesLattice::new(100.0, 0.05, 0.02, 0.25, grid).unwrap()
    }

    #[test]
    fn test_geometry() {
        let tree = tree(10);

        assert_eq!(tree.size(0), 1);
        assert_eq!(tree.size(10), 11);
        assert_eq!(tree.descendant(3, 2, 0), 2);
        assert_eq!(tree.descendant(3, 2, 1), 3);
        assert_relative_eq!(
            tree.probability(0, 0, 0) + tree.probability(0, 0, 1),
            1.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_nodes_recombine() {
        let tree = tree(4);
        // up then down returns to spot
        assert_relative_eq!(tree.underlying(2, 1), 100.0, epsilon = 1e-10);
        assert_relative_eq!(tree.underlying(0, 0), 100.0, epsilon = 1e-12);
        assert!(tree.underlying(4, 4) > tree.underlying(4, 3));
    }

    #[test]
    fn test_forward_is_martingale() {
        // Discounted expected spot one step ahead equals spot * exp(-q dt)
        let tree = tree(50);
        let next: Vec<f64> = (0..2).map(|j| tree.underlying(1, j)).collect();
        let rolled = tree.step_back(0, &next).unwrap();

        assert_relative_eq!(rolled[0], 100.0 * (-0.02_f64 * 0.02).exp(), epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_inputs() {
        let grid = TimeGrid::uniform(1.0, 10).unwrap();
        assert!(BlackScholesLattice::new(-1.0, 0.05, 0.0, 0.2, grid.clone()).is_err());
        assert!(BlackScholesLattice::new(100.0, 0.05, 0.0, 0.0, grid).is_err());

        let irregular = TimeGrid::from_times(&[0.3, 1.0]).unwrap();
        assert!(BlackScholesLattice::new(100.0, 0.05, 0.0, 0.2, irregular).is_err());
    }

    #[test]
    fn test_probability_out_of_range() {
        // Very high drift with low volatility on a coarse grid
        let grid = TimeGrid::uniform(10.0, 1).unwrap();
        let result = BlackScholesLattice::new(100.0, 0.5, 0.0, 0.01, grid);
        assert!(matches!(result, Err(LatticeError::InvalidInput { .. })));
    }
}

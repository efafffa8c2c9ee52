//! Single-node lattice with deterministic discounting.

use super::Lattice;
use crate::time_grid::TimeGrid;

/// A lattice with exactly one node per time.
///
/// Rolling back only discounts: there is no uncertainty, so every asset is
/// valued at its deterministic present value. The state variable exposed by
/// [`Lattice::underlying`] is the forward short rate over the step starting at
/// that time.
///
/// Unlike the trees, this lattice accepts any [`TimeGrid`], including grids
/// built from irregular mandatory times.
///
/// # Example
///
/// ```rust
/// use convex_lattice::{DeterministicLattice, Lattice, TimeGrid};
///
/// let grid = TimeGrid::from_times(&[1.0, 2.0]).unwrap();
/// let lattice = DeterministicLattice::flat(grid, 0.05);
/// assert!((lattice.discount(0, 0) - (-0.05_f64).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct DeterministicLattice {
    grid: TimeGrid,
    /// Discount factor over each step.
    discounts: Vec<f64>,
    /// Forward short rate at each grid time.
    forwards: Vec<f64>,
}

impl DeterministicLattice {
    /// Creates a lattice discounting at a flat continuously compounded rate.
    #[must_use]
    pub fn flat(grid: TimeGrid, rate: f64) -> Self {
        Self::from_zero_rates(grid, &|_t| rate)
    }

    /// Creates a lattice from continuously compounded zero rates `R(t)`.
    ///
    /// The discount factor to time `t` is `exp(-R(t) * t)`.
    #[must_use]
    pub fn from_zero_rates(grid: TimeGrid, zero_rates: &dyn Fn(f64) -> f64) -> Self {
        let curve_discount = |t: f64| {
            if t <= 0.0 {
                1.0
            } else {
                (-zero_rates(t) * t).exp()
            }
        };

        let discounts: Vec<f64> = grid
            .times()
            .windows(2)
            .map(|w| curve_discount(w[1]) / curve_discount(w[0]))
            .collect();

        let mut forwards: Vec<f64> = discounts
            .iter()
            .enumerate()
            .map(|(i, df)| -df.ln() / grid.dt(i))
            .collect();
        let last = forwards.last().copied().unwrap_or_else(|| zero_rates(0.0));
        forwards.push(last);

        Self {
            grid,
            discounts,
            forwards,
        }
    }
}

impl Lattice for DeterministicLattice {
    fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    fn size(&self, _i: usize) -> usize {
        1
    }

    fn branches(&self) -> usize {
        1
    }

    fn descendant(&self, _i: usize, _index: usize, _branch: usize) -> usize {
        0
    }

    fn probability(&self, _i: usize, _index: usize, _branch: usize) -> f64 {
        1.0
    }

    fn discount(&self, i: usize, _index: usize) -> f64 {
        self.discounts[i]
    }

    fn underlying(&self, i: usize, _index: usize) -> f64 {
        self.forwards[i]
    }
}

//! Recombining binomial tree of short rates.
//!
//! Built by a [`ShortRateModel`](crate::models::ShortRateModel) and consumed as a
//! [`Lattice`] by interest rate assets (discount bonds, swaps, swaptions).

use super::{require_uniform, Lattice};
use crate::error::{LatticeError, LatticeResult};
use crate::time_grid::TimeGrid;

/// A binomial short rate tree.
///
/// # Structure
///
/// At time step `i` there are `i + 1` states; state `j` at step `i` is
/// `rates[i][j]`. Branch 0 leads down to state `j` and branch 1 up to
/// state `j + 1`.
///
/// ```text
///                    [0,0]
///                   /     \
///              [1,1]       [1,0]
///             /    \      /    \
///         [2,2]   [2,1]  [2,1]  [2,0]
/// ```
///
/// A constant spread (an option-adjusted spread, say) can be layered on top
/// of every short rate for discounting with [`ShortRateTree::with_spread`].
#[derive(Debug, Clone)]
pub struct ShortRateTree {
    grid: TimeGrid,
    dt: f64,
    /// `rates[i][j]` = short rate at time step `i`, state `j`.
    rates: Vec<Vec<f64>>,
    /// `probabilities[i][j]` = (prob_up, prob_down) from node (i, j).
    probabilities: Vec<Vec<(f64, f64)>>,
    spread: f64,
}

impl ShortRateTree {
    /// Creates a tree on a uniform grid with zero rates and even odds.
    ///
    /// # Errors
    ///
    /// Fails if the grid is not uniform or has no steps.
    pub fn new(grid: TimeGrid) -> LatticeResult<Self> {
        let dt = require_uniform(&grid, "short rate tree")?;
        let steps = grid.steps();

        let rates = (0..=steps).map(|i| vec![0.0; i + 1]).collect();
        let probabilities = (0..steps).map(|i| vec![(0.5, 0.5); i + 1]).collect();

        Ok(Self {
            grid,
            dt,
            rates,
            probabilities,
            spread: 0.0,
        })
    }

    /// Returns a copy of this tree discounting at every short rate plus `spread`.
    #[must_use]
    pub fn with_spread(&self, spread: f64) -> Self {
        Self {
            spread,
            ..self.clone()
        }
    }

    /// Spread added to every short rate when discounting.
    #[must_use]
    pub fn spread(&self) -> f64 {
        self.spread
    }

    /// Number of time steps.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.grid.steps()
    }

    /// Time step size in years.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Returns the short rate at the given time step and state.
    ///
    /// # Panics
    ///
    /// Panics if `time_step > steps` or `state > time_step`.
    #[must_use]
    pub fn rate_at(&self, time_step: usize, state: usize) -> f64 {
        self.rates[time_step][state]
    }

    /// Sets the short rate at the given time step and state.
    ///
    /// # Panics
    ///
    /// Panics if `time_step > steps` or `state > time_step`.
    pub fn set_rate(&mut self, time_step: usize, state: usize, rate: f64) {
        self.rates[time_step][state] = rate;
    }

    /// Discount factor over one step from node (i, j) with an extra spread.
    ///
    /// DF = exp(-(r + spread) * dt)
    #[must_use]
    pub fn discount_factor(&self, time_step: usize, state: usize, spread: f64) -> f64 {
        let rate = self.rates[time_step][state] + spread;
        (-rate * self.dt).exp()
    }

    /// Number of states at the given time step (`time_step + 1`).
    #[must_use]
    pub fn states_at(&self, time_step: usize) -> usize {
        time_step + 1
    }

    /// Probability of an up move from the given node.
    #[must_use]
    pub fn prob_up(&self, time_step: usize, state: usize) -> f64 {
        self.probabilities
            .get(time_step)
            .map_or(0.5, |level| level[state].0)
    }

    /// Probability of a down move from the given node.
    #[must_use]
    pub fn prob_down(&self, time_step: usize, state: usize) -> f64 {
        self.probabilities
            .get(time_step)
            .map_or(0.5, |level| level[state].1)
    }

    /// Sets the transition probabilities at the given node.
    ///
    /// # Errors
    ///
    /// Fails if the node does not exist or the probabilities are not a
    /// distribution.
    pub fn set_probabilities(
        &mut self,
        time_step: usize,
        state: usize,
        prob_up: f64,
        prob_down: f64,
    ) -> LatticeResult<()> {
        if time_step >= self.steps() || state > time_step {
            return Err(LatticeError::invalid_input(format!(
                "no branching node ({time_step}, {state}) in a {}-step tree",
                self.steps()
            )));
        }
        if !(0.0..=1.0).contains(&prob_up)
            || !(0.0..=1.0).contains(&prob_down)
            || (prob_up + prob_down - 1.0).abs() > 1e-12
        {
            return Err(LatticeError::invalid_input(format!(
                "probabilities ({prob_up}, {prob_down}) at node ({time_step}, {state}) \
                 are not a distribution"
            )));
        }
        self.probabilities[time_step][state] = (prob_up, prob_down);
        Ok(())
    }

    /// Time in years at the given time step.
    #[must_use]
    pub fn time_at_step(&self, time_step: usize) -> f64 {
        self.grid.at(time_step)
    }

    /// Total maturity in years.
    #[must_use]
    pub fn maturity(&self) -> f64 {
        self.grid.back()
    }
}

impl Lattice for ShortRateTree {
    fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    fn size(&self, i: usize) -> usize {
        self.states_at(i)
    }

    fn branches(&self) -> usize {
        2
    }

    fn descendant(&self, _i: usize, index: usize, branch: usize) -> usize {
        index + branch
    }

    fn probability(&self, i: usize, index: usize, branch: usize) -> f64 {
        if branch == 1 {
            self.prob_up(i, index)
        } else {
            self.prob_down(i, index)
        }
    }

    fn discount(&self, i: usize, index: usize) -> f64 {
        self.discount_factor(i, index, self.spread)
    }

    fn underlying(&self, i: usize, index: usize) -> f64 {
        self.rate_at(i, index)
    }
}

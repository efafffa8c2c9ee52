//! Lattices for backward induction.
//!
//! This module provides:
//!
//! - **Lattice**: the contract every numerical lattice fulfils for the
//!   discretized assets rolled back on it
//! - **DeterministicLattice**: one node per time, discounting only
//! - **BlackScholesLattice**: Cox-Ross-Rubinstein binomial tree on spot
//! - **ShortRateTree**: recombining binomial tree of short rates
//!
//! # Overview
//!
//! A lattice is shared, read-only state. Assets hold an `Arc<dyn Lattice>`
//! and ask it for node counts and for the one-step transition; they never
//! mutate it, so any number of assets may be rolled back on the same lattice
//! concurrently.
//!
//! The node at index `j` at time step `i` moves to `descendant(i, j, b)` at
//! step `i + 1` along branch `b` with `probability(i, j, b)`:
//!
//! ```text
//!   step i            step i + 1
//!                  /-- descendant(i, j, 1)   p = probability(i, j, 1)
//!   node j  ------<
//!                  \-- descendant(i, j, 0)   p = probability(i, j, 0)
//! ```

mod black_scholes;
mod deterministic;
mod short_rate;

pub use black_scholes::BlackScholesLattice;
pub use deterministic::DeterministicLattice;
pub use short_rate::ShortRateTree;

use std::fmt;
use std::sync::Arc;

use crate::error::{LatticeError, LatticeResult};
use crate::time_grid::TimeGrid;

/// A numerical lattice spanning a [`TimeGrid`].
///
/// Implementors describe the geometry (node counts, branching) and the
/// per-step transition (probabilities and discounting). The provided
/// [`Lattice::step_back`] combines them into the rollback operator consumed by
/// discretized assets.
pub trait Lattice: Send + Sync + fmt::Debug {
    /// The time grid this lattice is built on.
    fn time_grid(&self) -> &TimeGrid;

    /// Number of nodes at time index `i`.
    fn size(&self, i: usize) -> usize;

    /// Number of branches leaving each node.
    fn branches(&self) -> usize;

    /// Index at step `i + 1` reached from node `index` at step `i` along `branch`.
    fn descendant(&self, i: usize, index: usize, branch: usize) -> usize;

    /// Probability of moving along `branch` from node `index` at step `i`.
    fn probability(&self, i: usize, index: usize, branch: usize) -> f64;

    /// Discount factor from step `i + 1` back to node `index` at step `i`.
    fn discount(&self, i: usize, index: usize) -> f64;

    /// State variable at node `index` of step `i` (spot, short rate, ...).
    fn underlying(&self, i: usize, index: usize) -> f64;

    /// Rolls a value vector from step `i + 1` back to step `i`.
    ///
    /// Each node receives the discounted expectation of its descendants.
    ///
    /// # Errors
    ///
    /// Returns a consistency error if `values` does not have one entry per
    /// node at step `i + 1`.
    fn step_back(&self, i: usize, values: &[f64]) -> LatticeResult<Vec<f64>> {
        let expected = self.size(i + 1);
        if values.len() != expected {
            return Err(LatticeError::size_mismatch(expected, values.len()));
        }

        let branches = self.branches();
        Ok((0..self.size(i))
            .map(|j| {
                let expectation: f64 = (0..branches)
                    .map(|b| self.probability(i, j, b) * values[self.descendant(i, j, b)])
                    .sum();
                expectation * self.discount(i, j)
            })
            .collect())
    }

    /// Number of nodes at time `t`, which must be on the grid.
    fn size_at(&self, t: f64) -> LatticeResult<usize> {
        Ok(self.size(self.time_grid().index(t)?))
    }

    /// State variable at every node of time `t`, which must be on the grid.
    fn grid(&self, t: f64) -> LatticeResult<Vec<f64>> {
        let i = self.time_grid().index(t)?;
        Ok((0..self.size(i)).map(|j| self.underlying(i, j)).collect())
    }
}

/// Returns true if both handles point at the same lattice instance.
#[must_use]
pub fn same_lattice(a: &Arc<dyn Lattice>, b: &Arc<dyn Lattice>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

/// Rejects grids with varying step sizes for lattices that need constant `dt`.
pub(crate) fn require_uniform(grid: &TimeGrid, lattice: &str) -> LatticeResult<f64> {
    if grid.steps() == 0 {
        return Err(LatticeError::invalid_input(format!(
            "{lattice} needs a grid with at least one step"
        )));
    }
    if !grid.is_uniform() {
        return Err(LatticeError::invalid_input(format!(
            "{lattice} needs a uniform time grid"
        )));
    }
    Ok(grid.dt(0))
}

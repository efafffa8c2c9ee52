//! Short rate models for interest rate tree construction.
//!
//! This module provides:
//!
//! - **Hull-White**: One-factor mean-reverting model fitted to the initial
//!   zero curve
//!
//! # Overview
//!
//! Short rate models describe the dynamics of the instantaneous interest rate
//! and build the [`ShortRateTree`] on which rate-dependent assets (discount
//! bonds, swaps, swaptions) are rolled back.

mod hull_white;

pub use hull_white::HullWhite;

use crate::error::LatticeResult;
use crate::lattice::ShortRateTree;
use crate::time_grid::TimeGrid;

/// Error type for model operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Invalid parameter.
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Invalid value.
        value: f64,
    },

    /// Tree construction failed.
    #[error("tree construction failed: {reason}")]
    TreeConstructionFailed {
        /// Reason for failure.
        reason: String,
    },
}

impl ModelError {
    /// Creates an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: &'static str, value: f64) -> Self {
        Self::InvalidParameter { name, value }
    }

    /// Creates a tree construction failed error.
    #[must_use]
    pub fn tree_construction_failed(reason: impl Into<String>) -> Self {
        Self::TreeConstructionFailed {
            reason: reason.into(),
        }
    }
}

/// A short rate model for building interest rate trees.
pub trait ShortRateModel: Send + Sync {
    /// Builds a short rate tree on `grid` fitted to the given zero curve.
    ///
    /// # Arguments
    ///
    /// * `zero_rates` - Continuously compounded zero rates as a function of time
    /// * `grid` - Uniform time grid the tree spans
    ///
    /// # Errors
    ///
    /// Fails if the grid is unsuitable or the curve cannot be fitted.
    fn build_tree(
        &self,
        zero_rates: &dyn Fn(f64) -> f64,
        grid: TimeGrid,
    ) -> LatticeResult<ShortRateTree>;

    /// Returns the volatility at time t.
    fn volatility(&self, t: f64) -> f64;

    /// Returns the mean reversion speed.
    fn mean_reversion(&self) -> f64;

    /// Returns the model name.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_display() {
        let err = ModelError::invalid_parameter("volatility", -0.01);
        assert_eq!(err.to_string(), "invalid parameter: volatility = -0.01");

        let err = ModelError::tree_construction_failed("discount sum is zero");
        assert!(err.to_string().contains("discount sum is zero"));
    }
}

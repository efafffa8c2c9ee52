//! Backward induction driver.
//!
//! The engine owns no market data: it takes a bound lattice and one or more
//! assets, merges their stopping times, and runs the rollback lifecycle.
//!
//! ```text
//!   stops = merge(mandatory times)      t_n > ... > t_1 > 0
//!   initialize(lattice, t_n)
//!   for t in stops: rollback(t)
//!   present_value()
//! ```

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::closeness::close_enough;
use crate::config::{LatticeConfig, Validate};
use crate::discretized::DiscretizedAsset;
use crate::error::{LatticeError, LatticeResult};
use crate::lattice::Lattice;
use crate::time_grid::TimeGrid;

/// Merges the mandatory times of several assets into stopping times.
///
/// The result is non-negative, free of near-duplicates, strictly decreasing,
/// and always ends with 0.
#[must_use]
pub fn merge_mandatory_times(assets: &[&dyn DiscretizedAsset]) -> Vec<f64> {
    let times: Vec<f64> = assets
        .iter()
        .flat_map(|asset| asset.mandatory_times())
        .collect();
    sort_stopping_times(times)
}

fn sort_stopping_times(mut times: Vec<f64>) -> Vec<f64> {
    times.retain(|t| t.is_finite() && *t >= 0.0);
    times.sort_by(|a, b| b.total_cmp(a));
    times.dedup_by(|a, b| close_enough(*a, *b));

    if times.last().map_or(true, |&t| !close_enough(t, 0.0)) {
        times.push(0.0);
    }
    times
}

/// Builds a grid containing every mandatory time, with at most
/// `config.steps` regular steps between 0 and the last time.
///
/// # Errors
///
/// Fails on negative or non-finite times.
pub fn build_time_grid(times: &[f64], config: &LatticeConfig) -> LatticeResult<TimeGrid> {
    TimeGrid::from_mandatory_times(times, config.steps)
}

/// Builds a uniform grid of `config.steps` steps ending at the last time.
///
/// Trees that need constant steps are built on this grid; the engine snaps
/// the remaining stopping times to it.
///
/// # Errors
///
/// Fails if no time is positive.
pub fn build_uniform_grid(times: &[f64], config: &LatticeConfig) -> LatticeResult<TimeGrid> {
    let end = times
        .iter()
        .copied()
        .filter(|t| t.is_finite())
        .fold(0.0_f64, f64::max);
    TimeGrid::uniform(end, config.steps)
}

/// Drives assets through backward induction on a shared lattice.
#[derive(Debug, Clone)]
pub struct RollbackEngine {
    config: LatticeConfig,
}

impl Default for RollbackEngine {
    fn default() -> Self {
        Self {
            config: LatticeConfig::default(),
        }
    }
}

impl RollbackEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: LatticeConfig) -> LatticeResult<Self> {
        config.validate_or_error()?;
        Ok(Self { config })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Stopping times of `asset` mapped onto the lattice grid.
    ///
    /// # Errors
    ///
    /// Fails if a stopping time lies beyond the grid, or, without snapping,
    /// if it is not a grid time.
    pub fn stopping_times(
        &self,
        asset: &dyn DiscretizedAsset,
        lattice: &dyn Lattice,
    ) -> LatticeResult<Vec<f64>> {
        let grid = lattice.time_grid();

        let mut stops = Vec::new();
        for t in merge_mandatory_times(&[asset]) {
            if !grid.spans(t) {
                return Err(LatticeError::invalid_input(format!(
                    "stopping time t = {t} lies beyond the lattice grid end t = {}",
                    grid.back()
                )));
            }
            let on_grid = if self.config.snap_to_grid {
                grid.closest_time(t)
            } else {
                grid.at(grid.index(t)?)
            };
            stops.push(on_grid);
        }

        Ok(sort_stopping_times(stops))
    }

    /// Values one asset on `lattice`.
    ///
    /// # Errors
    ///
    /// Propagates any lifecycle or grid error; the asset is left part way
    /// through its rollback.
    pub fn price(
        &self,
        asset: &mut dyn DiscretizedAsset,
        lattice: Arc<dyn Lattice>,
    ) -> LatticeResult<f64> {
        let stops = self.stopping_times(asset, lattice.as_ref())?;
        let start = stops[0];

        debug!(
            config = %self.config.name,
            stops = stops.len(),
            start,
            grid_steps = lattice.time_grid().steps(),
            "starting rollback"
        );

        asset.initialize(lattice, start)?;
        for &t in &stops {
            trace!(time = t, "rollback stop");
            asset.rollback(t)?;
        }

        let value = asset.present_value()?;
        debug!(value, "rollback complete");
        Ok(value)
    }

    /// Values independent assets on one shared lattice.
    ///
    /// Results are returned in input order; a failure is reported for its
    /// asset only.
    #[cfg(feature = "parallel")]
    pub fn price_many(
        &self,
        assets: &mut [Box<dyn DiscretizedAsset>],
        lattice: &Arc<dyn Lattice>,
    ) -> Vec<LatticeResult<f64>> {
        use rayon::prelude::*;

        debug!(assets = assets.len(), "pricing assets in parallel");
        assets
            .par_iter_mut()
            .enumerate()
            .map(|(index, asset)| self.price_logged(index, asset.as_mut(), lattice))
            .collect()
    }

    /// Values independent assets on one shared lattice.
    ///
    /// Results are returned in input order; a failure is reported for its
    /// asset only.
    #[cfg(not(feature = "parallel"))]
    pub fn price_many(
        &self,
        assets: &mut [Box<dyn DiscretizedAsset>],
        lattice: &Arc<dyn Lattice>,
    ) -> Vec<LatticeResult<f64>> {
        debug!(assets = assets.len(), "pricing assets sequentially");
        assets
            .iter_mut()
            .enumerate()
            .map(|(index, asset)| self.price_logged(index, asset.as_mut(), lattice))
            .collect()
    }

    fn price_logged(
        &self,
        index: usize,
        asset: &mut dyn DiscretizedAsset,
        lattice: &Arc<dyn Lattice>,
    ) -> LatticeResult<f64> {
        let result = self.price(asset, Arc::clone(lattice));
        if let Err(e) = &result {
            warn!(asset = index, error = %e, "asset valuation failed");
        }
        result
    }
}

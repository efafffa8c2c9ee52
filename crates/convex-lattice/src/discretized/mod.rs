//! Discretized assets and their rollback lifecycle.
//!
//! This module provides:
//!
//! - **AssetState**: the per-asset cursor (current time, node values,
//!   adjustment markers, lattice handle)
//! - **DiscretizedAsset**: the lifecycle every instrument implements
//! - **DiscretizedOption**: exercise optionality over an owned underlying
//! - Concrete instruments: discount bond, vanilla option, swap, convertible
//!
//! # Overview
//!
//! An asset is bound to a lattice at its latest relevant time and rolled back
//! towards the valuation date. At every mandatory stop two adjustment phases
//! run:
//!
//! ```text
//!   later  <---------------------------------------------  earlier
//!   initialize(t_n)  rollback(t_k) ... rollback(t_1)  rollback(0)  present_value()
//!                        |
//!                        +-- partial_rollback(t_k)   transition only
//!                        +-- pre_adjust_values()     settlements due at t_k
//!                        +-- post_adjust_values()    decisions on settled state
//! ```
//!
//! Each phase runs at most once per time: a second call at the same stop is a
//! no-op. Time never moves forward.

mod convertible;
mod discount_bond;
mod option;
mod swap;
mod vanilla;

pub use convertible::{
    CallabilityKind, CallabilitySchedule, CashFlow, ConvertibleArguments, DiscretizedConvertible,
};
pub use discount_bond::DiscretizedDiscountBond;
pub use option::DiscretizedOption;
pub use swap::{DiscretizedSwap, SwapArguments, SwapType};
pub use vanilla::{DiscretizedVanillaOption, OptionType, PlainVanillaPayoff};

use std::fmt;
use std::sync::Arc;

use crate::closeness::close_enough;
use crate::error::{LatticeError, LatticeResult};
use crate::lattice::Lattice;

/// Mutable state shared by every discretized asset.
#[derive(Debug, Clone)]
pub struct AssetState {
    time: f64,
    latest_pre_adjustment: f64,
    latest_post_adjustment: f64,
    values: Vec<f64>,
    lattice: Option<Arc<dyn Lattice>>,
}

impl Default for AssetState {
    fn default() -> Self {
        Self {
            time: 0.0,
            latest_pre_adjustment: f64::MAX,
            latest_post_adjustment: f64::MAX,
            values: Vec::new(),
            lattice: None,
        }
    }
}

impl AssetState {
    /// Creates an unbound state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time of the asset.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Node values at the current time.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable node values at the current time.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Replaces the node values.
    pub fn set_values(&mut self, values: Vec<f64>) {
        self.values = values;
    }

    /// Lattice the asset is bound to, if any.
    #[must_use]
    pub fn lattice(&self) -> Option<&Arc<dyn Lattice>> {
        self.lattice.as_ref()
    }

    fn bind(&mut self, lattice: Arc<dyn Lattice>, time: f64) {
        self.time = time;
        self.latest_pre_adjustment = f64::MAX;
        self.latest_post_adjustment = f64::MAX;
        self.lattice = Some(lattice);
    }
}

/// An instrument discretized on a lattice.
///
/// Implementors supply storage ([`state`](Self::state)), the terminal
/// condition ([`reset`](Self::reset)) and their stopping times; they override
/// the adjustment hooks where the instrument pays or decides something. The
/// provided methods implement the rollback lifecycle and must not be
/// overridden.
pub trait DiscretizedAsset: Send + fmt::Debug {
    /// Shared asset state.
    fn state(&self) -> &AssetState;

    /// Mutable shared asset state.
    fn state_mut(&mut self) -> &mut AssetState;

    /// (Re)allocates the values for `size` nodes and seeds the terminal condition.
    ///
    /// Called by [`initialize`](Self::initialize) once the asset is bound.
    fn reset(&mut self, size: usize) -> LatticeResult<()>;

    /// Times at which rollback must stop for this asset.
    ///
    /// Unordered, possibly with duplicates; never negative.
    fn mandatory_times(&self) -> Vec<f64>;

    /// Settlements occurring at the current time.
    fn pre_adjust_values_impl(&mut self) -> LatticeResult<()> {
        Ok(())
    }

    /// Decisions taken on the settled state at the current time.
    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        Ok(())
    }

    /// Moves the values from grid index `i + 1` to `i`.
    ///
    /// Defaults to the lattice's discounted expectation. Instruments carrying
    /// auxiliary per-node vectors override it to roll those back as well.
    fn step_back(&mut self, lattice: &dyn Lattice, i: usize) -> LatticeResult<()> {
        let values = lattice.step_back(i, self.state().values())?;
        self.state_mut().set_values(values);
        Ok(())
    }

    /// Current time.
    fn time(&self) -> f64 {
        self.state().time()
    }

    /// Node values at the current time.
    fn values(&self) -> &[f64] {
        self.state().values()
    }

    /// The lattice this asset is bound to.
    ///
    /// # Errors
    ///
    /// Returns a sequence error if the asset has not been initialized.
    fn lattice(&self) -> LatticeResult<&Arc<dyn Lattice>> {
        self.state()
            .lattice()
            .ok_or_else(|| LatticeError::sequence("asset is not bound to a lattice"))
    }

    /// Binds the asset to `lattice` at time `t` and resets its values.
    ///
    /// # Errors
    ///
    /// Fails if `t` is not on the lattice grid, or if `reset` fails (a wrapped
    /// asset bound to a different lattice, for example).
    fn initialize(&mut self, lattice: Arc<dyn Lattice>, t: f64) -> LatticeResult<()> {
        let grid = lattice.time_grid();
        let i = grid.index(t)?;
        let time = grid.at(i);
        let size = lattice.size(i);

        self.state_mut().bind(lattice, time);
        self.reset(size)
    }

    /// Rolls back to `to` and adjusts the values there.
    ///
    /// # Errors
    ///
    /// See [`partial_rollback`](Self::partial_rollback).
    fn rollback(&mut self, to: f64) -> LatticeResult<()> {
        self.partial_rollback(to)?;
        self.adjust_values()
    }

    /// Rolls back to `to` without adjusting the values at `to`.
    ///
    /// Intermediate grid times are adjusted on the way. Rolling back to the
    /// current time does nothing.
    ///
    /// # Errors
    ///
    /// Returns a sequence error if `to` is later than the current time or the
    /// asset is unbound, and an error if `to` is not on the grid.
    fn partial_rollback(&mut self, to: f64) -> LatticeResult<()> {
        let from = self.time();
        if close_enough(from, to) {
            return Ok(());
        }
        if to > from {
            return Err(LatticeError::sequence(format!(
                "cannot roll back from t = {from} to later time t = {to}"
            )));
        }

        let lattice = Arc::clone(self.lattice()?);
        let grid = lattice.time_grid();
        let i_from = grid.index(from)?;
        let i_to = grid.index(to)?;

        for i in (i_to..i_from).rev() {
            self.step_back(lattice.as_ref(), i)?;
            self.state_mut().time = grid.at(i);
            if i != i_to {
                self.adjust_values()?;
            }
        }
        Ok(())
    }

    /// Runs the settlement phase once for the current time.
    fn pre_adjust_values(&mut self) -> LatticeResult<()> {
        let time = self.time();
        if !close_enough(time, self.state().latest_pre_adjustment) {
            self.pre_adjust_values_impl()?;
            self.state_mut().latest_pre_adjustment = time;
        }
        Ok(())
    }

    /// Runs the decision phase once for the current time.
    fn post_adjust_values(&mut self) -> LatticeResult<()> {
        let time = self.time();
        if !close_enough(time, self.state().latest_post_adjustment) {
            self.post_adjust_values_impl()?;
            self.state_mut().latest_post_adjustment = time;
        }
        Ok(())
    }

    /// Runs both adjustment phases for the current time.
    fn adjust_values(&mut self) -> LatticeResult<()> {
        self.pre_adjust_values()?;
        self.post_adjust_values()
    }

    /// Returns true if `t`, snapped to the lattice grid, is the current time.
    ///
    /// False when the asset is unbound or `t` lies outside the grid.
    fn is_on_time(&self, t: f64) -> bool {
        let Some(lattice) = self.state().lattice() else {
            return false;
        };
        let grid = lattice.time_grid();
        grid.spans(t) && close_enough(grid.closest_time(t), self.time())
    }

    /// Value at the valuation date.
    ///
    /// # Errors
    ///
    /// Returns a sequence error unless the asset has been rolled back to
    /// time 0, and a consistency error if more than one node remains.
    fn present_value(&self) -> LatticeResult<f64> {
        if !close_enough(self.time(), 0.0) {
            return Err(LatticeError::sequence(format!(
                "present value requested at t = {}, roll back to 0 first",
                self.time()
            )));
        }
        match self.values() {
            [value] => Ok(*value),
            values => Err(LatticeError::consistency(format!(
                "expected a single node at t = 0, found {}",
                values.len()
            ))),
        }
    }
}

impl DiscretizedAsset for Box<dyn DiscretizedAsset> {
    fn state(&self) -> &AssetState {
        (**self).state()
    }

    fn state_mut(&mut self) -> &mut AssetState {
        (**self).state_mut()
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        (**self).reset(size)
    }

    fn mandatory_times(&self) -> Vec<f64> {
        (**self).mandatory_times()
    }

    fn pre_adjust_values_impl(&mut self) -> LatticeResult<()> {
        (**self).pre_adjust_values_impl()
    }

    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        (**self).post_adjust_values_impl()
    }

    fn step_back(&mut self, lattice: &dyn Lattice, i: usize) -> LatticeResult<()> {
        (**self).step_back(lattice, i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::DeterministicLattice;
    use crate::time_grid::TimeGrid;
    use approx::assert_relative_eq;

    /// Records every adjustment it receives.
    #[derive(Debug, Default)]
    struct Recorder {
        state: AssetState,
        pre_calls: Vec<f64>,
        post_calls: Vec<f64>,
    }

    impl DiscretizedAsset for Recorder {
        fn state(&self) -> &AssetState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut AssetState {
            &mut self.state
        }

        fn reset(&mut self, size: usize) -> LatticeResult<()> {
            self.state.set_values(vec![1.0; size]);
            Ok(())
        }

        fn mandatory_times(&self) -> Vec<f64> {
            vec![1.0]
        }

        fn pre_adjust_values_impl(&mut self) -> LatticeResult<()> {
            self.pre_calls.push(self.time());
            Ok(())
        }

        fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
            self.post_calls.push(self.time());
            Ok(())
        }
    }

    fn lattice() -> Arc<dyn Lattice> {
        let grid = TimeGrid::uniform(1.0, 4).unwrap();
        Arc::new(DeterministicLattice::flat(grid, 0.05))
    }

    #[test]
    fn test_partial_rollback_adjusts_intermediate_times_only() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 1.0).unwrap();
        asset.partial_rollback(0.25).unwrap();

        assert_eq!(asset.pre_calls, vec![0.75, 0.5]);
        assert_eq!(asset.post_calls, vec![0.75, 0.5]);
        assert_relative_eq!(asset.time(), 0.25);

        asset.rollback(0.25).unwrap();
        assert_eq!(asset.pre_calls, vec![0.75, 0.5, 0.25]);
    }

    #[test]
    fn test_adjustments_are_idempotent() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 1.0).unwrap();

        asset.adjust_values().unwrap();
        asset.adjust_values().unwrap();
        asset.post_adjust_values().unwrap();

        assert_eq!(asset.pre_calls, vec![1.0]);
        assert_eq!(asset.post_calls, vec![1.0]);
    }

    #[test]
    fn test_rollback_to_current_time_is_noop() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 0.5).unwrap();
        asset.partial_rollback(0.5).unwrap();

        assert!(asset.pre_calls.is_empty());
        assert_eq!(asset.values(), &[1.0]);
    }

    #[test]
    fn test_forward_rollback_is_sequence_error() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 0.5).unwrap();

        let err = asset.rollback(0.75).unwrap_err();
        assert!(matches!(err, LatticeError::Sequence { .. }));
    }

    #[test]
    fn test_present_value_before_zero_is_sequence_error() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 1.0).unwrap();

        assert!(matches!(
            asset.present_value(),
            Err(LatticeError::Sequence { .. })
        ));

        asset.rollback(0.0).unwrap();
        assert_relative_eq!(
            asset.present_value().unwrap(),
            (-0.05_f64).exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unbound_asset() {
        let mut asset = Recorder::default();

        assert!(!asset.is_on_time(0.0));
        assert!(matches!(asset.lattice(), Err(LatticeError::Sequence { .. })));
        assert!(matches!(
            asset.partial_rollback(-1.0),
            Err(LatticeError::Sequence { .. })
        ));
    }

    #[test]
    fn test_initialize_off_grid_fails() {
        let mut asset = Recorder::default();
        assert!(asset.initialize(lattice(), 0.3).is_err());
    }

    #[test]
    fn test_is_on_time_snaps_to_grid() {
        let mut asset = Recorder::default();
        asset.initialize(lattice(), 0.5).unwrap();

        assert!(asset.is_on_time(0.5));
        assert!(asset.is_on_time(0.55));
        assert!(!asset.is_on_time(0.75));
        assert!(!asset.is_on_time(-0.1));
        assert!(!asset.is_on_time(2.0));
    }

    #[test]
    fn test_boxed_asset_delegates() {
        let mut asset: Box<dyn DiscretizedAsset> = Box::<Recorder>::default();
        asset.initialize(lattice(), 1.0).unwrap();
        asset.rollback(0.0).unwrap();

        assert_eq!(asset.mandatory_times(), vec![1.0]);
        assert!(asset.present_value().is_ok());
    }
}

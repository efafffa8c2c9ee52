//! Exercise optionality over an owned underlying asset.

use std::sync::Arc;

use super::{AssetState, DiscretizedAsset};
use crate::error::{LatticeError, LatticeResult};
use crate::exercise::Exercise;
use crate::lattice::same_lattice;

/// An option to enter an underlying asset.
///
/// The option owns its underlying and drives its whole lifecycle: at every
/// stop `T` it brings the underlying to `T`, lets it settle payments due at
/// `T`, takes the exercise decision against the settled value, and only then
/// lets the underlying apply its own decisions.
///
/// A Bermudan swaption is `DiscretizedOption` over a
/// [`DiscretizedSwap`](super::DiscretizedSwap).
#[derive(Debug)]
pub struct DiscretizedOption {
    state: AssetState,
    underlying: Box<dyn DiscretizedAsset>,
    exercise: Exercise,
    // Set once this option has bound the underlying itself
    owns_binding: bool,
}

impl DiscretizedOption {
    /// Wraps `underlying` with the given exercise.
    pub fn new<A: DiscretizedAsset + 'static>(underlying: A, exercise: Exercise) -> Self {
        Self::from_boxed(Box::new(underlying), exercise)
    }

    /// Wraps an already boxed underlying.
    #[must_use]
    pub fn from_boxed(underlying: Box<dyn DiscretizedAsset>, exercise: Exercise) -> Self {
        Self {
            state: AssetState::new(),
            underlying,
            exercise,
            owns_binding: false,
        }
    }

    /// The wrapped asset.
    #[must_use]
    pub fn underlying(&self) -> &dyn DiscretizedAsset {
        self.underlying.as_ref()
    }

    /// The exercise descriptor.
    #[must_use]
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    /// Replaces each node value by the larger of itself and the underlying's.
    ///
    /// # Errors
    ///
    /// Returns a consistency error if the option and its underlying do not
    /// have the same number of nodes.
    pub fn apply_exercise_condition(&mut self) -> LatticeResult<()> {
        let underlying = self.underlying.values();
        let values = self.state.values_mut();
        if values.len() != underlying.len() {
            return Err(LatticeError::size_mismatch(values.len(), underlying.len()));
        }

        for (value, &exercised) in values.iter_mut().zip(underlying) {
            *value = value.max(exercised);
        }
        Ok(())
    }
}

impl DiscretizedAsset for DiscretizedOption {
    fn state(&self) -> &AssetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssetState {
        &mut self.state
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        let lattice = Arc::clone(self.lattice()?);
        let now = self.time();

        if let Some(own) = self.underlying.state().lattice() {
            if !self.owns_binding && !same_lattice(own, &lattice) {
                return Err(LatticeError::consistency(
                    "option and underlying were initialized on different lattices",
                ));
            }
        }
        self.underlying.initialize(lattice, now)?;
        self.owns_binding = true;

        self.state.set_values(vec![0.0; size]);
        self.adjust_values()
    }

    fn mandatory_times(&self) -> Vec<f64> {
        let mut times = self.underlying.mandatory_times();
        times.extend(self.exercise.future_times());
        times
    }

    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        let now = self.time();

        self.underlying.partial_rollback(now)?;
        self.underlying.pre_adjust_values()?;

        if self
            .exercise
            .is_exercisable_at(now, |t| self.is_on_time(t))?
        {
            self.apply_exercise_condition()?;
        }

        self.underlying.post_adjust_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretized::DiscretizedDiscountBond;
    use crate::engine::RollbackEngine;
    use crate::lattice::{DeterministicLattice, Lattice};
    use crate::time_grid::TimeGrid;
    use approx::assert_relative_eq;

    fn lattice() -> Arc<dyn Lattice> {
        let grid = TimeGrid::uniform(2.0, 8).unwrap();
        Arc::new(DeterministicLattice::flat(grid, 0.0))
    }

    /// Pays `coupon` at `pay_time` in the settlement phase and wipes its
    /// value in the decision phase.
    #[derive(Debug, Default)]
    struct SettleThenWipe {
        state: AssetState,
        pay_time: f64,
        coupon: f64,
    }

    impl DiscretizedAsset for SettleThenWipe {
        fn state(&self) -> &AssetState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut AssetState {
            &mut self.state
        }

        fn reset(&mut self, size: usize) -> LatticeResult<()> {
            self.state.set_values(vec![0.0; size]);
            Ok(())
        }

        fn mandatory_times(&self) -> Vec<f64> {
            vec![self.pay_time]
        }

        fn pre_adjust_values_impl(&mut self) -> LatticeResult<()> {
            if self.is_on_time(self.pay_time) {
                let coupon = self.coupon;
                self.state.values_mut().iter_mut().for_each(|v| *v += coupon);
            }
            Ok(())
        }

        fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
            if self.is_on_time(self.pay_time) {
                self.state.values_mut().iter_mut().for_each(|v| *v = 0.0);
            }
            Ok(())
        }
    }

    #[test]
    fn test_exercise_sees_settled_underlying() {
        let underlying = SettleThenWipe {
            pay_time: 1.0,
            coupon: 5.0,
            ..Default::default()
        };
        let mut option = DiscretizedOption::new(underlying, Exercise::european(1.0).unwrap());

        option.initialize(lattice(), 2.0).unwrap();
        option.rollback(1.0).unwrap();

        // The coupon was visible to the exercise decision before the wipe
        assert_relative_eq!(option.values()[0], 5.0);
        assert_relative_eq!(option.underlying().values()[0], 0.0);

        option.rollback(0.0).unwrap();
        assert_relative_eq!(option.present_value().unwrap(), 5.0);
    }

    #[test]
    fn test_repeated_adjustment_does_not_double_count() {
        let underlying = SettleThenWipe {
            pay_time: 1.0,
            coupon: 5.0,
            ..Default::default()
        };
        let mut option = DiscretizedOption::new(underlying, Exercise::european(1.0).unwrap());

        option.initialize(lattice(), 2.0).unwrap();
        option.rollback(1.0).unwrap();
        option.post_adjust_values().unwrap();
        option.adjust_values().unwrap();

        assert_relative_eq!(option.values()[0], 5.0);
    }

    #[test]
    fn test_mandatory_times_filter_then_union() {
        let bond = DiscretizedDiscountBond::new(3.0);
        let exercise = Exercise::bermudan(vec![-1.0, 1.0, 2.0]).unwrap();
        let option = DiscretizedOption::new(bond, exercise);

        let mut times = option.mandatory_times();
        times.sort_by(f64::total_cmp);
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_underlying_on_other_lattice() {
        let mut bond = DiscretizedDiscountBond::new(2.0);
        bond.initialize(lattice(), 2.0).unwrap();

        let mut option = DiscretizedOption::new(bond, Exercise::european(1.0).unwrap());
        let err = option.initialize(lattice(), 2.0).unwrap_err();
        assert!(matches!(err, LatticeError::Consistency { .. }));
    }

    #[test]
    fn test_underlying_on_same_lattice() {
        let shared = lattice();
        let mut bond = DiscretizedDiscountBond::new(2.0);
        bond.initialize(Arc::clone(&shared), 2.0).unwrap();

        let mut option = DiscretizedOption::new(bond, Exercise::european(2.0).unwrap());
        option.initialize(shared, 2.0).unwrap();
        assert_relative_eq!(option.values()[0], 1.0);
    }

    #[test]
    fn test_reprice_on_same_and_other_lattice() {
        let engine = RollbackEngine::default();
        let mut option = DiscretizedOption::new(
            DiscretizedDiscountBond::new(1.0),
            Exercise::american(0.0, 1.0).unwrap(),
        );
        let curve = |steps: usize| -> Arc<dyn Lattice> {
            let grid = TimeGrid::uniform(1.0, steps).unwrap();
            Arc::new(DeterministicLattice::flat(grid, 0.03))
        };

        let shared = curve(10);
        let first = engine.price(&mut option, Arc::clone(&shared)).unwrap();
        let second = engine.price(&mut option, shared).unwrap();
        let finer = engine.price(&mut option, curve(100)).unwrap();

        let discount = (-0.03_f64).exp();
        assert_relative_eq!(first, discount, epsilon = 1e-12);
        assert_relative_eq!(second, first, epsilon = 1e-12);
        assert_relative_eq!(finer, first, epsilon = 1e-12);
    }

    #[test]
    fn test_malformed_exercise_surfaces_at_branch() {
        let json = r#"{"exercise_type":"European","times":[]}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        let mut option = DiscretizedOption::new(DiscretizedDiscountBond::new(2.0), exercise);

        let err = option.initialize(lattice(), 2.0).unwrap_err();
        assert!(matches!(err, LatticeError::InvariantViolation { .. }));
    }

    #[test]
    fn test_apply_exercise_condition_length_mismatch() {
        let mut option = DiscretizedOption::new(
            DiscretizedDiscountBond::new(1.0),
            Exercise::european(1.0).unwrap(),
        );
        option.state.set_values(vec![0.0; 3]);
        assert!(matches!(
            option.apply_exercise_condition(),
            Err(LatticeError::Consistency { .. })
        ));
    }
}

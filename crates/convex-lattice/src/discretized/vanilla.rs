//! Option paying a function of the lattice state variable.

use serde::{Deserialize, Serialize};

use super::{AssetState, DiscretizedAsset};
use crate::error::{LatticeError, LatticeResult};
use crate::exercise::Exercise;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

/// Intrinsic value `max(S - K, 0)` for calls, `max(K - S, 0)` for puts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlainVanillaPayoff {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: f64,
}

impl PlainVanillaPayoff {
    /// Creates a payoff.
    #[must_use]
    pub fn new(option_type: OptionType, strike: f64) -> Self {
        Self {
            option_type,
            strike,
        }
    }

    /// Payoff at state `spot`.
    #[must_use]
    pub fn value(&self, spot: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - spot).max(0.0),
        }
    }
}

/// Vanilla option on the lattice state variable (spot on an equity tree).
///
/// Exercise replaces the continuation value with the payoff wherever the
/// payoff is larger.
#[derive(Debug, Clone)]
pub struct DiscretizedVanillaOption {
    state: AssetState,
    payoff: PlainVanillaPayoff,
    exercise: Exercise,
}

impl DiscretizedVanillaOption {
    /// Creates the option.
    #[must_use]
    pub fn new(payoff: PlainVanillaPayoff, exercise: Exercise) -> Self {
        Self {
            state: AssetState::new(),
            payoff,
            exercise,
        }
    }

    /// The payoff.
    #[must_use]
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// The exercise descriptor.
    #[must_use]
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    fn apply_specific_condition(&mut self) -> LatticeResult<()> {
        let spots = self.lattice()?.grid(self.time())?;
        let values = self.state.values_mut();
        if spots.len() != values.len() {
            return Err(LatticeError::size_mismatch(spots.len(), values.len()));
        }

        for (value, spot) in values.iter_mut().zip(spots) {
            *value = value.max(self.payoff.value(spot));
        }
        Ok(())
    }
}

impl DiscretizedAsset for DiscretizedVanillaOption {
    fn state(&self) -> &AssetState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AssetState {
        &mut self.state
    }

    fn reset(&mut self, size: usize) -> LatticeResult<()> {
        self.state.set_values(vec![0.0; size]);
        self.adjust_values()
    }

    fn mandatory_times(&self) -> Vec<f64> {
        self.exercise.future_times().collect()
    }

    fn post_adjust_values_impl(&mut self) -> LatticeResult<()> {
        let now = self.time();
        if self
            .exercise
            .is_exercisable_at(now, |t| self.is_on_time(t))?
        {
            self.apply_specific_condition()?;
        }
        Ok(())
    }
}

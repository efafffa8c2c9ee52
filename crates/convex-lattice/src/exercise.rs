//! Exercise descriptors.
//!
//! An [`Exercise`] tells a discretized option when the holder may exercise.
//! Times are in lattice-time units (years from the valuation date); any
//! conversion from calendar dates happens before the descriptor is built.

use serde::{Deserialize, Serialize};

use crate::closeness::close_enough;
use crate::error::{LatticeError, LatticeResult};

/// Exercise style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseType {
    /// Exercisable at any time within a window.
    American,
    /// Exercisable on a set of discrete dates.
    Bermudan,
    /// Exercisable on a single date.
    European,
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseType::American => write!(f, "American"),
            ExerciseType::Bermudan => write!(f, "Bermudan"),
            ExerciseType::European => write!(f, "European"),
        }
    }
}

/// An exercise descriptor: style plus times.
///
/// - American: exactly two times, the window `[open, close]`
/// - Bermudan: one or more times
/// - European: exactly one time
///
/// The constructors enforce these shapes. A descriptor deserialized from
/// external data is not re-validated; a malformed one is reported as an
/// [`LatticeError::InvariantViolation`] when an option first evaluates it.
///
/// # Example
///
/// ```rust
/// use convex_lattice::{Exercise, ExerciseType};
///
/// let exercise = Exercise::bermudan(vec![2.0, 1.0, 3.0]).unwrap();
/// assert_eq!(exercise.exercise_type(), ExerciseType::Bermudan);
/// assert_eq!(exercise.times(), &[1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    exercise_type: ExerciseType,
    times: Vec<f64>,
}

impl Exercise {
    /// American exercise between `open` and `close` inclusive.
    ///
    /// # Errors
    ///
    /// Fails if `close` precedes `open` or either is not finite.
    pub fn american(open: f64, close: f64) -> LatticeResult<Self> {
        if !open.is_finite() || !close.is_finite() {
            return Err(LatticeError::invalid_input(
                "American exercise window must be finite",
            ));
        }
        if close < open {
            return Err(LatticeError::invalid_input(format!(
                "American exercise window closes at {close} before it opens at {open}"
            )));
        }
        Ok(Self {
            exercise_type: ExerciseType::American,
            times: vec![open, close],
        })
    }

    /// Bermudan exercise on the given times (sorted on construction).
    ///
    /// # Errors
    ///
    /// Fails if no times are given or any time is not finite.
    pub fn bermudan(mut times: Vec<f64>) -> LatticeResult<Self> {
        if times.is_empty() {
            return Err(LatticeError::invalid_input(
                "Bermudan exercise needs at least one time",
            ));
        }
        if times.iter().any(|t| !t.is_finite()) {
            return Err(LatticeError::invalid_input(
                "exercise times must be finite",
            ));
        }
        times.sort_by(f64::total_cmp);
        Ok(Self {
            exercise_type: ExerciseType::Bermudan,
            times,
        })
    }

    /// European exercise at `time`.
    ///
    /// # Errors
    ///
    /// Fails if `time` is not finite.
    pub fn european(time: f64) -> LatticeResult<Self> {
        if !time.is_finite() {
            return Err(LatticeError::invalid_input(
                "exercise times must be finite",
            ));
        }
        Ok(Self {
            exercise_type: ExerciseType::European,
            times: vec![time],
        })
    }

    /// Exercise style.
    #[must_use]
    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }

    /// Exercise times (window bounds for American).
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Last time at which exercise is possible.
    #[must_use]
    pub fn last_time(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Exercise times that are not in the past.
    pub fn future_times(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied().filter(|&t| t >= 0.0)
    }

    /// Decides whether exercise is possible at `now`.
    ///
    /// `on_time` reports whether a listed exercise time coincides with the
    /// current lattice stop; it is consulted for Bermudan and European
    /// descriptors only.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvariantViolation`] if the descriptor does not
    /// have the shape its style requires.
    pub fn is_exercisable_at(&self, now: f64, on_time: impl Fn(f64) -> bool) -> LatticeResult<bool> {
        match self.exercise_type {
            ExerciseType::American => match *self.times.as_slice() {
                [open, close] => {
                    let after_open = now >= open || close_enough(now, open);
                    let before_close = now <= close || close_enough(now, close);
                    Ok(after_open && before_close)
                }
                _ => Err(self.malformed()),
            },
            ExerciseType::European if self.times.len() != 1 => Err(self.malformed()),
            ExerciseType::Bermudan if self.times.is_empty() => Err(self.malformed()),
            ExerciseType::Bermudan | ExerciseType::European => {
                Ok(self.future_times().any(on_time))
            }
        }
    }

    fn malformed(&self) -> LatticeError {
        LatticeError::invariant_violation(format!(
            "{} exercise with {} time(s)",
            self.exercise_type,
            self.times.len()
        ))
    }
}

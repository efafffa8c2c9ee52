//! Time grids for lattice discretization.
//!
//! A [`TimeGrid`] is the strictly increasing sequence of times on which a
//! lattice is built. It always starts at 0 (the valuation time) and, when
//! built from mandatory times, contains every one of them exactly.

use serde::{Deserialize, Serialize};

use crate::closeness::close_enough;
use crate::error::{LatticeError, LatticeResult};

/// Relative tolerance used to decide whether a grid has constant steps.
const UNIFORM_TOLERANCE: f64 = 1e-10;

/// A strictly increasing sequence of times starting at 0.
///
/// # Structure
///
/// ```text
///   t[0] = 0      t[1]        t[2]   ...   t[n] = end
///     |-----------|-----------|--- ... ---|
///        dt(0)       dt(1)
/// ```
///
/// # Example
///
/// ```rust
/// use convex_lattice::TimeGrid;
///
/// // Steps of at most 0.25, stopping exactly on 0.3 and 1.0
/// let grid = TimeGrid::from_mandatory_times(&[1.0, 0.3], 4).unwrap();
/// assert_eq!(grid.front(), 0.0);
/// assert_eq!(grid.back(), 1.0);
/// assert!(grid.index(0.3).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    times: Vec<f64>,
    dt: Vec<f64>,
    mandatory_times: Vec<f64>,
}

impl TimeGrid {
    /// Creates a regularly spaced grid from 0 to `end` with `steps` intervals.
    ///
    /// # Arguments
    ///
    /// * `end` - Last time on the grid (must be positive)
    /// * `steps` - Number of time steps (must be at least 1)
    pub fn uniform(end: f64, steps: usize) -> LatticeResult<Self> {
        if !end.is_finite() || end <= 0.0 {
            return Err(LatticeError::invalid_input(format!(
                "grid end must be positive, got {end}"
            )));
        }
        if steps == 0 {
            return Err(LatticeError::invalid_input("grid needs at least one step"));
        }

        let n = steps as f64;
        let times: Vec<f64> = (0..=steps)
            .map(|i| if i == steps { end } else { end * i as f64 / n })
            .collect();

        Ok(Self::from_parts(times, vec![end]))
    }

    /// Creates a grid containing every mandatory time, filling the gaps with
    /// regular steps.
    ///
    /// The largest step is `max(mandatory) / steps`; each interval between
    /// consecutive mandatory times is split into the fewest equal steps that
    /// are no longer than it. With `steps == 0` the largest step is the
    /// smallest gap between mandatory times, so only the mandatory times
    /// themselves (plus 0) end up on the grid when they are evenly spaced.
    ///
    /// Mandatory times are sorted and deduplicated; negative times are
    /// rejected.
    pub fn from_mandatory_times(mandatory: &[f64], steps: usize) -> LatticeResult<Self> {
        let sorted = sorted_unique(mandatory)?;
        let last = sorted.last().copied().unwrap_or(0.0);

        if last <= 0.0 {
            return Ok(Self::from_parts(vec![0.0], sorted));
        }

        let dt_max = if steps == 0 {
            let mut begin = 0.0;
            let mut smallest = f64::INFINITY;
            for &end in sorted.iter().filter(|&&t| t > 0.0) {
                smallest = smallest.min(end - begin);
                begin = end;
            }
            smallest
        } else {
            last / steps as f64
        };

        let mut times = vec![0.0];
        let mut period_begin = 0.0;
        for &period_end in sorted.iter().filter(|&&t| t > 0.0) {
            let span = period_end - period_begin;
            let n_steps = ((span / dt_max - 1e-9).ceil() as usize).max(1);
            let dt = span / n_steps as f64;
            for k in 1..n_steps {
                times.push(period_begin + k as f64 * dt);
            }
            times.push(period_end);
            period_begin = period_end;
        }

        Ok(Self::from_parts(times, sorted))
    }

    /// Creates a grid whose points are exactly the given times (plus 0).
    pub fn from_times(times: &[f64]) -> LatticeResult<Self> {
        let sorted = sorted_unique(times)?;
        let mut points = vec![0.0];
        points.extend(sorted.iter().copied().filter(|&t| t > 0.0));
        Ok(Self::from_parts(points, sorted))
    }

    fn from_parts(times: Vec<f64>, mandatory_times: Vec<f64>) -> Self {
        let dt = times.windows(2).map(|w| w[1] - w[0]).collect();
        Self {
            times,
            dt,
            mandatory_times,
        }
    }

    /// Returns the index of the grid point equal to `t`.
    ///
    /// Fails if `t` is not on the grid (within closeness tolerance).
    pub fn index(&self, t: f64) -> LatticeResult<usize> {
        if !t.is_finite() {
            return Err(LatticeError::invalid_input(format!(
                "required time must be finite, got t = {t}"
            )));
        }
        let i = self.closest_index(t);
        if close_enough(t, self.times[i]) {
            return Ok(i);
        }

        if t < self.front() {
            Err(LatticeError::invalid_input(format!(
                "inadequate time grid: all nodes are later than the required time t = {t} \
                 (earliest node is t1 = {})",
                self.front()
            )))
        } else if t > self.back() {
            Err(LatticeError::invalid_input(format!(
                "inadequate time grid: all nodes are earlier than the required time t = {t} \
                 (latest node is t1 = {})",
                self.back()
            )))
        } else {
            let (j, k) = if t > self.times[i] { (i, i + 1) } else { (i - 1, i) };
            Err(LatticeError::invalid_input(format!(
                "inadequate time grid: the nodes closest to the required time t = {t} \
                 are t1 = {} and t2 = {}",
                self.times[j], self.times[k]
            )))
        }
    }

    /// Returns the index of the grid point closest to `t`.
    ///
    /// Ties resolve to the earlier point.
    #[must_use]
    pub fn closest_index(&self, t: f64) -> usize {
        let size = self.times.len();
        let result = self.times.partition_point(|&x| x < t);

        if result == 0 {
            0
        } else if result == size {
            size - 1
        } else {
            let dt1 = self.times[result] - t;
            let dt2 = t - self.times[result - 1];
            if dt1 < dt2 {
                result
            } else {
                result - 1
            }
        }
    }

    /// Returns the grid point closest to `t`.
    #[must_use]
    pub fn closest_time(&self, t: f64) -> f64 {
        self.times[self.closest_index(t)]
    }

    /// Returns true if `t` lies within `[front, back]` (within tolerance).
    #[must_use]
    pub fn spans(&self, t: f64) -> bool {
        (t >= self.front() || close_enough(t, self.front()))
            && (t <= self.back() || close_enough(t, self.back()))
    }

    /// Returns the time at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[must_use]
    pub fn at(&self, i: usize) -> f64 {
        self.times[i]
    }

    /// Returns the step size between `t[i]` and `t[i + 1]`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len() - 1`.
    #[must_use]
    pub fn dt(&self, i: usize) -> f64 {
        self.dt[i]
    }

    /// Returns the number of grid points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Returns true if the grid has no points. Grids built by this module
    /// always contain at least time 0.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the number of steps (`len() - 1`).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.dt.len()
    }

    /// First grid time (always 0).
    #[must_use]
    pub fn front(&self) -> f64 {
        self.times[0]
    }

    /// Last grid time.
    #[must_use]
    pub fn back(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// All grid times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The sorted, deduplicated mandatory times the grid was built from.
    #[must_use]
    pub fn mandatory_times(&self) -> &[f64] {
        &self.mandatory_times
    }

    /// Returns true if every step has the same size.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        match self.dt.first() {
            Some(&first) => self
                .dt
                .iter()
                .all(|&dt| (dt - first).abs() <= UNIFORM_TOLERANCE * first),
            None => true,
        }
    }
}

/// Sorts times ascending and drops near-duplicates, rejecting negatives.
fn sorted_unique(times: &[f64]) -> LatticeResult<Vec<f64>> {
    if let Some(&bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(LatticeError::invalid_input(format!(
            "negative or non-finite time not allowed: {bad}"
        )));
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|a, b| close_enough(*a, *b));
    Ok(sorted)
}

//! Floating-point closeness for lattice times.
//!
//! Times reach the engine from day-count conversions and grid arithmetic, so
//! exact equality is never used to compare them.

/// Default tolerance multiplier, in units of machine epsilon.
pub const DEFAULT_ULPS: u32 = 42;

/// Returns true if `x` and `y` are equal within [`DEFAULT_ULPS`] epsilons.
#[must_use]
pub fn close_enough(x: f64, y: f64) -> bool {
    close_enough_n(x, y, DEFAULT_ULPS)
}

/// Returns true if `x` and `y` are equal within `n` epsilons.
///
/// The tolerance is relative to the larger of the two magnitudes; when one of
/// the values is exactly zero an absolute tolerance of `(n * eps)^2` is used.
#[must_use]
pub fn close_enough_n(x: f64, y: f64, n: u32) -> bool {
    if x == y {
        return true;
    }

    let diff = (x - y).abs();
    let tolerance = f64::from(n) * f64::EPSILON;

    if x == 0.0 || y == 0.0 {
        return diff < tolerance * tolerance;
    }

    diff <= tolerance * x.abs() || diff <= tolerance * y.abs()
}

//! CLI command implementations.

pub mod bond;
pub mod config;
pub mod convertible;
pub mod option;
pub mod swaption;

// Re-export submodules for convenience
pub use bond::BondArgs;
pub use config::ConfigArgs;
pub use convertible::ConvertibleArgs;
pub use option::OptionArgs;
pub use swaption::SwaptionArgs;

use std::path::Path;

use clap::Args;
use convex_lattice::config::Validate;
use convex_lattice::LatticeConfig;
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Loads an engine configuration, falling back to the defaults.
///
/// Files ending in `.json` are read as JSON, anything else as TOML.
pub fn load_config(path: Option<&Path>) -> CliResult<LatticeConfig> {
    let Some(path) = path else {
        return Ok(LatticeConfig::default());
    };

    let text = std::fs::read_to_string(path)?;
    let config_error = |reason: String| CliError::Config {
        path: path.to_path_buf(),
        reason,
    };

    let config: LatticeConfig = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text).map_err(|e| config_error(e.to_string()))?
    } else {
        toml::from_str(&text).map_err(|e| config_error(e.to_string()))?
    };

    config
        .validate_or_error()
        .map_err(|e| config_error(e.to_string()))?;
    debug!(path = %path.display(), name = %config.name, "loaded engine configuration");
    Ok(config)
}

/// Applies a `--steps` override to the loaded configuration.
pub fn with_steps(config: &LatticeConfig, steps: Option<usize>) -> LatticeConfig {
    match steps {
        Some(steps) => config.clone().with_steps(steps),
        None => config.clone(),
    }
}

/// Linear zero curve `R(t) = rate + slope * t` shared by the rate commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct CurveArgs {
    /// Continuously compounded zero rate at t = 0 (decimal)
    #[arg(long, default_value = "0.03")]
    pub rate: f64,

    /// Zero rate slope per year (decimal)
    #[arg(long, default_value = "0.0")]
    pub slope: f64,
}

impl CurveArgs {
    /// Zero rate at `t`.
    pub fn zero_rate(&self, t: f64) -> f64 {
        self.rate + self.slope * t
    }

    /// Discount factor to `t`.
    pub fn discount(&self, t: f64) -> f64 {
        (-self.zero_rate(t) * t).exp()
    }
}

/// Validates a strictly positive quantity.
pub fn validate_positive(name: &'static str, value: f64) -> CliResult<f64> {
    if value <= 0.0 || !value.is_finite() {
        return Err(CliError::invalid(name, value, "Must be positive."));
    }
    Ok(value)
}

/// Validates a volatility given as a decimal.
pub fn validate_volatility(value: f64) -> CliResult<f64> {
    if !(0.0..=5.0).contains(&value) {
        return Err(CliError::invalid(
            "volatility",
            value,
            "Use a decimal between 0 and 5, e.g. 0.2 for 20%.",
        ));
    }
    Ok(value)
}

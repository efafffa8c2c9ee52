//! Engine configuration.
//!
//! [`LatticeConfig`] controls how the rollback engine discretizes time. It is
//! plain serde data so it can be loaded from TOML or JSON files.

use serde::{Deserialize, Serialize};

use crate::error::{LatticeError, LatticeResult};

// =============================================================================
// LATTICE CONFIGURATION
// =============================================================================

/// Configuration of the rollback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Configuration name/identifier.
    #[serde(default = "default_name")]
    pub name: String,

    /// Description of this configuration.
    #[serde(default)]
    pub description: Option<String>,

    /// Time steps used when the engine builds a grid itself.
    #[serde(default = "default_steps")]
    pub steps: usize,

    /// Snap stopping times to the closest grid time. When false, every
    /// stopping time must already be on the lattice grid.
    #[serde(default = "default_snap_to_grid")]
    pub snap_to_grid: bool,
}

fn default_name() -> String {
    "DEFAULT".to_string()
}

fn default_steps() -> usize {
    200
}

fn default_snap_to_grid() -> bool {
    true
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self::new(default_name())
    }
}

impl LatticeConfig {
    /// Creates a configuration with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            steps: default_steps(),
            snap_to_grid: default_snap_to_grid(),
        }
    }

    /// Coarse grid for quick indicative values.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            description: Some("Coarse grid for indicative pricing".to_string()),
            steps: 50,
            ..Self::new("COARSE")
        }
    }

    /// Fine grid for reference values.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            description: Some("Fine grid for reference pricing".to_string()),
            steps: 2000,
            ..Self::new("FINE")
        }
    }

    /// Sets the number of time steps.
    #[must_use]
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets whether stopping times are snapped to the grid.
    #[must_use]
    pub fn with_snap_to_grid(mut self, snap: bool) -> Self {
        self.snap_to_grid = snap;
        self
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Validation error details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation.
    pub field: String,
    /// Validation error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Trait for validating configuration.
pub trait Validate {
    /// Returns every validation error, or an empty vector if valid.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates and returns an error listing every problem if invalid.
    fn validate_or_error(&self) -> LatticeResult<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }

        let reason = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(LatticeError::invalid_input(reason))
    }
}

impl Validate for LatticeConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push(ValidationError::new("name", "Name cannot be empty"));
        }

        if self.steps == 0 || self.steps > 100_000 {
            errors.push(ValidationError::new(
                "steps",
                format!("Steps {} must be between 1 and 100000", self.steps),
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LatticeConfig::default();
        assert_eq!(config.name, "DEFAULT");
        assert_eq!(config.steps, 200);
        assert!(config.snap_to_grid);
        assert!(config.is_valid());
    }

    #[test]
    fn test_presets() {
        assert!(LatticeConfig::coarse().steps < LatticeConfig::fine().steps);
        assert!(LatticeConfig::coarse().is_valid());
        assert!(LatticeConfig::fine().is_valid());
    }

    #[test]
    fn test_validation() {
        let config = LatticeConfig::new("").with_steps(0);
        let errors = config.validate();
        assert_eq!(errors.len(), 2);

        let err = config.validate_or_error().unwrap_err();
        assert!(matches!(err, LatticeError::InvalidInput { .. }));
        assert!(err.to_string().contains("steps"));
    }

    #[test]
    fn test_serde_defaults() {
        let config: LatticeConfig = serde_json::from_str(r#"{"steps": 400}"#).unwrap();
        assert_eq!(config.steps, 400);
        assert_eq!(config.name, "DEFAULT");
        assert!(config.snap_to_grid);

        let json = serde_json::to_string(&config).unwrap();
        let back: LatticeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

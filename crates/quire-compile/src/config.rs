//! Compilation settings.
//!
//! Settings can be written in YAML or JSON. Every field has a default, so
//! an empty document is a valid configuration:
//!
//! ```yaml
//! optimisation_level: 2
//! safety_mode: audit
//! max_iterations: 50
//! routing:
//!   bridges: false
//!   placement: trivial
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};
use crate::pass::SafetyMode;
use crate::passes::Placement;

/// Highest supported optimisation level.
pub const MAX_OPTIMISATION_LEVEL: u8 = 2;

/// Settings for a backend's default compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Optimisation level, clamped to `0..=2`.
    pub optimisation_level: u8,

    /// Whether preconditions are audited while compiling.
    pub safety_mode: SafetyMode,

    /// Cap on iterations of repeating passes. Unbounded when absent.
    pub max_iterations: Option<usize>,

    /// Placement and routing settings.
    pub routing: RoutingConfig,
}

/// Placement and routing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Replace distance-two CX gates with BRIDGEs instead of swapping.
    pub bridges: bool,

    /// Initial placement strategy.
    pub placement: Placement,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            optimisation_level: 1,
            safety_mode: SafetyMode::Default,
            max_iterations: None,
            routing: RoutingConfig::default(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            bridges: true,
            placement: Placement::Line,
        }
    }
}

impl CompileConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> CompileResult<Self> {
        let config: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| CompileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> CompileResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CompileError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, as JSON when the extension is `.json` and YAML
    /// otherwise.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CompileError::Config(format!("{}: {e}", path.display())))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> CompileResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| CompileError::Config(e.to_string()))
    }

    /// Reject settings that cannot be honoured.
    pub fn validate(&self) -> CompileResult<()> {
        if self.max_iterations == Some(0) {
            return Err(CompileError::Config(
                "max_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The optimisation level, clamped to the supported range.
    pub fn optimisation_level(&self) -> u8 {
        self.optimisation_level.min(MAX_OPTIMISATION_LEVEL)
    }

    /// Set the optimisation level.
    #[must_use]
    pub fn with_optimisation_level(mut self, level: u8) -> Self {
        self.optimisation_level = level;
        self
    }

    /// Set the safety mode.
    #[must_use]
    pub fn with_safety_mode(mut self, mode: SafetyMode) -> Self {
        self.safety_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompileConfig::default();
        assert_eq!(config.optimisation_level(), 1);
        assert_eq!(config.safety_mode, SafetyMode::Default);
        assert!(config.routing.bridges);
        assert_eq!(config.routing.placement, Placement::Line);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = CompileConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, CompileConfig::default());
    }

    #[test]
    fn test_yaml_fields() {
        let yaml = "optimisation_level: 7\nsafety_mode: audit\nrouting:\n  placement: trivial\n";
        let config = CompileConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.optimisation_level(), MAX_OPTIMISATION_LEVEL);
        assert_eq!(config.safety_mode, SafetyMode::Audit);
        assert_eq!(config.routing.placement, Placement::Trivial);
        // Unset nested fields keep their defaults.
        assert!(config.routing.bridges);
    }

    #[test]
    fn test_json_fields() {
        let config =
            CompileConfig::from_json_str(r#"{"max_iterations": 10, "routing": {"bridges": false}}"#)
                .unwrap();
        assert_eq!(config.max_iterations, Some(10));
        assert!(!config.routing.bridges);
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            CompileConfig::from_yaml_str("safety_mode: reckless"),
            Err(CompileError::Config(_))
        ));
        assert!(matches!(
            CompileConfig::from_json_str(r#"{"max_iterations": 0}"#),
            Err(CompileError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = CompileConfig::default().with_optimisation_level(2);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(CompileConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}

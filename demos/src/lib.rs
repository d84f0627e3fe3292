//! Quire Demo Suite
//!
//! Sample circuits and helpers used by the `quire-demo` driver:
//!
//! - **QFT**: dense controlled-phase ladder, stresses routing
//! - **Ripple adder**: Toffoli-heavy, stresses decomposition
//! - **Teleportation**: mid-circuit measurement and classical control
//! - **Ising layer**: `rzz` couplings on a ring, stresses placement
//!
//! Devices are described in YAML or JSON, the same format
//! [`quire_compile::Device`] serializes to.

pub mod circuits;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result, bail};
use quire_compile::{Architecture, Device};

/// Built-in architecture presets.
pub const PRESETS: &[&str] = &["line", "ring", "grid", "star", "full"];

/// Build a preset architecture with at least `n` nodes.
pub fn preset(name: &str, n: u32) -> Result<Architecture> {
    let n = n.max(2);
    Ok(match name {
        "line" => Architecture::line(n),
        "ring" => Architecture::ring(n),
        "grid" => {
            let cols = (1..=n).find(|c| c * c >= n).unwrap_or(n);
            Architecture::grid(n.div_ceil(cols), cols)
        }
        "star" => Architecture::star(n),
        "full" => Architecture::fully_connected(n),
        other => bail!("unknown architecture preset '{other}' (expected one of {PRESETS:?})"),
    })
}

/// Load a device description, as JSON when the extension is `.json` and
/// YAML otherwise.
pub fn load_device(path: &Path) -> Result<Device> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read device file {}", path.display()))?;

    let device = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents).context("Failed to parse device JSON")?
    } else {
        serde_yaml_ng::from_str(&contents).context("Failed to parse device YAML")?
    };
    Ok(device)
}

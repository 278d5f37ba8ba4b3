//! YAML scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use terracov_itm::PropagationParameters;

use crate::budget::LinkBudget;
use crate::scan::ScanOptions;
use crate::Result;

/// Complete configuration of a coverage scan.
///
/// ```yaml
/// radio:
///   frequency_mhz: 800
///   tx_height_m: 30
///   climate: maritime_temperate_over_land
/// link_budget:
///   tx_power_dbm: 43
///   noise_floor_dbm: -104
///   required_snr_db: 9
/// scan:
///   workers: 4
/// ```
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Radio and ground parameters.
    pub radio: PropagationParameters,
    /// Power budget.
    pub link_budget: LinkBudget,
    /// Scan options.
    pub scan: ScanOptions,
}

impl CoverageConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check every section against its documented ranges.
    pub fn validate(&self) -> Result<()> {
        self.radio.validate()?;
        self.link_budget.validate()?;
        self.scan.validate()
    }

    /// Model parameters for the radio section.
    pub fn propagation_parameters(&self) -> PropagationParameters {
        self.radio
    }

    /// Loss budget (dB) from the link budget section.
    pub fn max_attenuation_db(&self) -> f64 {
        self.link_budget.max_attenuation_db()
    }
}

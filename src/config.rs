//! # Detector configuration.

use anyhow::{Context as _, Result};
use serde::Deserialize;

/// Selects the detectors [`BounceDetector`](crate::BounceDetector) runs.
///
/// Every field is optional in the TOML form:
///
/// ```toml
/// qmail = false
/// assume_delivery_status = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Recognize qmail plain text bounces.
    pub qmail: bool,

    /// Recognize RFC 3464 delivery reports.
    pub standard: bool,

    /// Take a `multipart/report` without `report-type` parameter for a
    /// delivery report.
    pub assume_delivery_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            qmail: true,
            standard: true,
            assume_delivery_status: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
        let config = Config::default();
        assert!(config.qmail);
        assert!(config.standard);
        assert!(!config.assume_delivery_status);
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str("qmail = false\nassume_delivery_status = true\n").unwrap();
        assert_eq!(
            config,
            Config {
                qmail: false,
                standard: true,
                assume_delivery_status: true,
            }
        );
    }

    #[test]
    fn test_from_toml_str_errors() {
        assert!(Config::from_toml_str("qmail = \"yes\"").is_err());
        assert!(Config::from_toml_str("unknown = true").is_err());
    }
}

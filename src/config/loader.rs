// src/config/loader.rs
//! TOML configuration loading

use crate::config::{AcquisitionConfig, ConfigError};
use std::path::Path;
use tracing::debug;

/// Loads and validates acquisition configurations.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<AcquisitionConfig, ConfigError> {
        let config: AcquisitionConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<AcquisitionConfig, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&raw)?;
        debug!(path = %path.as_ref().display(), "loaded acquisition configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config = ConfigLoader::from_toml_str(
            r#"
            addresses = [0x40, 0x41]
            duration_us = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.addresses, vec![0x40, 0x41]);
        assert_eq!(config.duration_us, 2000);
        assert!(config.measure_current);
        assert!(!config.measure_voltage);
        assert_eq!(config.conversion_time_us, 140);
        assert_eq!(config.recovery.setup_attempts, 5);
    }

    #[test]
    fn test_recovery_section_overrides() {
        let config = ConfigLoader::from_toml_str(
            r#"
            [recovery]
            setup_attempts = 2
            read_retry_budget = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.recovery.setup_attempts, 2);
        assert_eq!(config.recovery.read_retry_budget, 3);
        assert_eq!(config.recovery.settle_time_ms, 10);
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let result = ConfigLoader::from_toml_str("addresses = [");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_semantically_invalid_file_is_rejected() {
        let result = ConfigLoader::from_toml_str("addresses = []");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "duration_us = 1400").unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.duration_us, 1400);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = ConfigLoader::load_from_path("/nonexistent/powermon.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

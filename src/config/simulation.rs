use serde::Deserialize;
use std::path::Path;

use crate::pathfinding::DEFAULT_CACHE_TTL_MS;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_path_cache_ttl_ms")]
    pub path_cache_ttl_ms: u64,
    #[serde(default = "default_stockpile_capacity")]
    pub stockpile_capacity: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_crop_growth_rate")]
    pub crop_growth_rate: f64,
    #[serde(default = "default_regrowth_rate")]
    pub regrowth_rate: f64,
}

fn default_path_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}
fn default_stockpile_capacity() -> f64 {
    200.0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_crop_growth_rate() -> f64 {
    0.05
}
fn default_regrowth_rate() -> f64 {
    0.5
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            path_cache_ttl_ms: default_path_cache_ttl_ms(),
            stockpile_capacity: default_stockpile_capacity(),
            log_level: default_log_level(),
            crop_growth_rate: default_crop_growth_rate(),
            regrowth_rate: default_regrowth_rate(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.path_cache_ttl_ms == 0 {
            errors.push(format!(
                "path_cache_ttl_ms must be > 0, got {}. Example: path_cache_ttl_ms = 5000",
                self.path_cache_ttl_ms
            ));
        }

        if !(self.stockpile_capacity > 0.0 && self.stockpile_capacity.is_finite()) {
            errors.push(format!(
                "stockpile_capacity must be > 0.0, got {}. Example: stockpile_capacity = 200.0",
                self.stockpile_capacity
            ));
        }

        if !(0.0..=1.0).contains(&self.crop_growth_rate) {
            errors.push(format!(
                "crop_growth_rate must be 0.0-1.0, got {}. Example: crop_growth_rate = 0.05",
                self.crop_growth_rate
            ));
        }

        if !(self.regrowth_rate >= 0.0 && self.regrowth_rate.is_finite()) {
            errors.push(format!(
                "regrowth_rate must be >= 0.0, got {}. Example: regrowth_rate = 0.5",
                self.regrowth_rate
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-config.toml")
    }

    #[test]
    fn valid_config_loads_all_fields() {
        let toml = r#"
            path_cache_ttl_ms = 2500
            stockpile_capacity = 500.0
            log_level = "debug"
            crop_growth_rate = 0.1
            regrowth_rate = 1.5
        "#;
        let config = SimulationConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.path_cache_ttl_ms, 2500);
        assert_eq!(config.stockpile_capacity, 500.0);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.crop_growth_rate, 0.1);
        assert_eq!(config.regrowth_rate, 1.5);
    }

    #[test]
    fn defaults_applied_for_empty_config() {
        let config = SimulationConfig::from_toml_str("", &test_path()).unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.path_cache_ttl_ms, 5000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = SimulationConfig::from_toml_str("path_cache_ttl_ms = 0", &test_path()).unwrap_err();
        assert!(err.contains("path_cache_ttl_ms"));
        assert!(err.contains("> 0"));
    }

    #[test]
    fn invalid_capacity_rejected() {
        let err =
            SimulationConfig::from_toml_str("stockpile_capacity = -5.0", &test_path()).unwrap_err();
        assert!(err.contains("stockpile_capacity"));
    }

    #[test]
    fn invalid_crop_rate_rejected() {
        let err =
            SimulationConfig::from_toml_str("crop_growth_rate = 2.0", &test_path()).unwrap_err();
        assert!(err.contains("crop_growth_rate"));
        assert!(err.contains("0.0-1.0"));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let err =
            SimulationConfig::from_toml_str(r#"log_level = "verbose""#, &test_path()).unwrap_err();
        assert!(err.contains("log_level"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let toml = "path_cache_ttl_ms = 0\nstockpile_capacity = 0.0\nregrowth_rate = -1.0";
        let err = SimulationConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("path_cache_ttl_ms"));
        assert!(err.contains("stockpile_capacity"));
        assert!(err.contains("regrowth_rate"));
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err = SimulationConfig::from_toml_str("regrowth_rate = [invalid", &test_path())
            .unwrap_err();
        assert!(err.contains("test-config.toml"));
    }

    #[test]
    fn from_file_loads_valid_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "regrowth_rate = 2.0").unwrap();
        let config = SimulationConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.regrowth_rate, 2.0);
    }

    #[test]
    fn from_file_missing_file_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.contains("Cannot read"));
    }
}

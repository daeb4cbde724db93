use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "RENTAL_SCOUT_CONFIG";

/// What to do with a listing whose owner profile could not be fetched
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnerFailurePolicy {
    /// Leave the listing out of the result set
    #[default]
    Drop,
    /// Keep it under the unknown-owner label, outside the radius
    UnknownOwner,
}

/// Bounds of the search radius slider, in meters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadiusBounds {
    pub min_m: f64,
    pub max_m: f64,
    pub default_m: f64,
}

impl Default for RadiusBounds {
    fn default() -> Self {
        Self {
            min_m: 200.0,
            max_m: 10_000.0,
            default_m: 1_000.0,
        }
    }
}

impl RadiusBounds {
    /// Never panics; with inverted bounds `max_m` wins
    pub fn clamp(&self, radius_m: f64) -> f64 {
        if radius_m.is_nan() {
            return self.default_m;
        }
        radius_m.max(self.min_m).min(self.max_m)
    }
}

/// Search behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub radius: RadiusBounds,
    pub owner_failure_policy: OwnerFailurePolicy,
    pub unknown_owner_label: String,
    /// Upper bound for a single owner lookup
    pub lookup_timeout_ms: u64,
    /// Owner lookups in flight at once
    pub max_concurrent_lookups: usize,
    /// Candidates considered per search after text filtering
    pub max_candidates: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            radius: RadiusBounds::default(),
            owner_failure_policy: OwnerFailurePolicy::Drop,
            unknown_owner_label: "Unknown".to_string(),
            lookup_timeout_ms: 5_000,
            max_concurrent_lookups: 16,
            max_candidates: 500,
        }
    }
}

impl AppConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Read and validate a JSON config file; absent keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config file named by `RENTAL_SCOUT_CONFIG`, or defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(path),
            None => {
                debug!("{} not set, using default config", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.radius;
        if !(r.min_m >= 0.0 && r.min_m <= r.max_m) {
            anyhow::bail!("radius bounds inverted: min {} > max {}", r.min_m, r.max_m);
        }
        if !(r.min_m..=r.max_m).contains(&r.default_m) {
            anyhow::bail!(
                "default radius {} outside [{}, {}]",
                r.default_m,
                r.min_m,
                r.max_m
            );
        }
        if self.max_concurrent_lookups == 0 {
            anyhow::bail!("max_concurrent_lookups must be at least 1");
        }
        if self.lookup_timeout_ms == 0 {
            anyhow::bail!("lookup_timeout_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.owner_failure_policy, OwnerFailurePolicy::Drop);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn radius_is_clamped_to_bounds() {
        let bounds = RadiusBounds::default();
        assert_eq!(bounds.clamp(50.0), 200.0);
        assert_eq!(bounds.clamp(25_000.0), 10_000.0);
        assert_eq!(bounds.clamp(1_200.0), 1_200.0);
        assert_eq!(bounds.clamp(f64::NAN), 1_000.0);
    }

    #[test]
    fn inverted_bounds_clamp_without_panicking() {
        let bounds = RadiusBounds {
            min_m: 5_000.0,
            max_m: 1_000.0,
            default_m: 2_000.0,
        };
        assert_eq!(bounds.clamp(50.0), 1_000.0);
        assert_eq!(bounds.clamp(3_000.0), 1_000.0);
        assert_eq!(bounds.clamp(25_000.0), 1_000.0);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"owner_failure_policy": "unknown_owner", "radius": {{"max_m": 5000.0}}}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.owner_failure_policy, OwnerFailurePolicy::UnknownOwner);
        assert_eq!(config.radius.max_m, 5_000.0);
        assert_eq!(config.radius.min_m, 200.0);
        assert_eq!(config.max_concurrent_lookups, 16);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = AppConfig {
            max_concurrent_lookups: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            radius: RadiusBounds {
                min_m: 5_000.0,
                max_m: 1_000.0,
                default_m: 2_000.0,
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::lifecycle::LifecycleTimings;
use crate::logging::LogLevel;
use crate::propfile::PropertyFile;

/// Error type for configuration values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("dormant delay ({dormant:?}) must exceed mischief delay ({mischief:?})")]
    DelayOrder { mischief: Duration, dormant: Duration },
}

/// Options that can be set via CLI or config file
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Inactivity before mischief
    pub mischief_delay: Duration,
    /// Inactivity before departing to dormant
    pub dormant_delay: Duration,
    /// Cadence of the idle animation cycle
    pub idle_variety_period: Duration,
    /// Show only the first frame of every animation
    pub reduced_motion: bool,
    /// Audio state used when no preference has been persisted
    pub audio_default: bool,
    pub log_level: LogLevel,
    /// Preference file; preferences live in memory when unset
    pub prefs_path: Option<PathBuf>,
    /// Base directory for sprite sheets and sounds
    pub assets_dir: Option<PathBuf>,
    /// Demo loop period
    pub tick: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mischief_delay: Duration::from_millis(5000),
            dormant_delay: Duration::from_millis(15000),
            idle_variety_period: Duration::from_millis(8000),
            reduced_motion: false,
            audio_default: true,
            log_level: LogLevel::Info,
            prefs_path: None,
            assets_dir: None,
            tick: Duration::from_millis(16),
        }
    }
}

impl Options {
    /// Lifecycle timer settings
    pub fn timings(&self) -> LifecycleTimings {
        LifecycleTimings {
            mischief_delay: self.mischief_delay,
            dormant_delay: self.dormant_delay,
            idle_variety_period: self.idle_variety_period,
        }
    }

    /// Apply one `key = value` setting. Returns false for an unknown key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key {
            "mischiefDelayMs" => self.mischief_delay = parse_millis(value).map_err(invalid)?,
            "dormantDelayMs" => self.dormant_delay = parse_millis(value).map_err(invalid)?,
            "idleVarietyPeriodMs" => {
                self.idle_variety_period = parse_millis(value).map_err(invalid)?
            }
            "reducedMotion" => self.reduced_motion = parse_bool(value).map_err(invalid)?,
            "audioEnabled" => self.audio_default = parse_bool(value).map_err(invalid)?,
            "logLevel" => self.log_level = value.parse().map_err(invalid)?,
            "prefsPath" => self.prefs_path = parse_path(value),
            "assetsDir" => self.assets_dir = parse_path(value),
            "tickMs" => self.tick = parse_millis(value).map_err(invalid)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mischief_delay.is_zero() {
            return Err(ConfigError::ZeroDuration("mischief delay"));
        }
        if self.idle_variety_period.is_zero() {
            return Err(ConfigError::ZeroDuration("idle variety period"));
        }
        if self.tick.is_zero() {
            return Err(ConfigError::ZeroDuration("tick"));
        }
        if self.dormant_delay <= self.mischief_delay {
            return Err(ConfigError::DelayOrder {
                mischief: self.mischief_delay,
                dormant: self.dormant_delay,
            });
        }
        Ok(())
    }
}

/// Load configuration from a property file.
///
/// Without a path the defaults are returned. Unknown keys are logged and
/// skipped; malformed values fail the load.
pub fn load_config(path: Option<&Path>) -> Result<Options> {
    let mut options = Options::default();
    let Some(path) = path else {
        return Ok(options);
    };

    let file = PropertyFile::load(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    apply_properties(&mut options, &file)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    options.validate()?;
    Ok(options)
}

/// Apply every property of `file` to `options`
pub fn apply_properties(options: &mut Options, file: &PropertyFile) -> Result<(), ConfigError> {
    for (key, value) in file.iter() {
        if !options.apply(key, value)? {
            log::warn!("config: unknown key {:?} ignored", key);
        }
    }
    Ok(())
}

/// Parse a boolean setting
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err("expected a boolean".to_string()),
    }
}

/// Parse a whole number of milliseconds
pub fn parse_millis(s: &str) -> Result<Duration, String> {
    s.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("expected milliseconds: {}", e))
}

fn parse_path(s: &str) -> Option<PathBuf> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(PathBuf::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let options = Options::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.timings(), LifecycleTimings::default());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool(" Off "), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("250"), Ok(Duration::from_millis(250)));
        assert!(parse_millis("-5").is_err());
        assert!(parse_millis("5s").is_err());
    }

    #[test]
    fn test_apply_known_and_unknown_keys() {
        let mut options = Options::default();
        assert_eq!(options.apply("reducedMotion", "yes"), Ok(true));
        assert_eq!(options.apply("logLevel", "debug"), Ok(true));
        assert_eq!(options.apply("prefsPath", "/tmp/imp.prefs"), Ok(true));
        assert_eq!(options.apply("colour", "red"), Ok(false));

        assert!(options.reduced_motion);
        assert_eq!(options.log_level, LogLevel::Debug);
        assert_eq!(options.prefs_path, Some(PathBuf::from("/tmp/imp.prefs")));
    }

    #[test]
    fn test_apply_rejects_bad_value() {
        let mut options = Options::default();
        let err = options.apply("mischiefDelayMs", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "mischiefDelayMs"));
    }

    #[test]
    fn test_validate_delay_order() {
        let options = Options {
            mischief_delay: Duration::from_millis(5000),
            dormant_delay: Duration::from_millis(5000),
            ..Options::default()
        };
        assert!(matches!(options.validate(), Err(ConfigError::DelayOrder { .. })));
    }

    #[test]
    fn test_validate_zero_tick() {
        let options = Options {
            tick: Duration::ZERO,
            ..Options::default()
        };
        assert_eq!(options.validate(), Err(ConfigError::ZeroDuration("tick")));
    }

    #[test]
    fn test_load_config_without_path() {
        assert_eq!(load_config(None).unwrap(), Options::default());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.cfg");
        fs::write(
            &path,
            "# imp settings\nmischiefDelayMs = 2000\ndormantDelayMs = 6000\nreducedMotion = true\nshoeSize = 44\n",
        )
        .unwrap();

        let options = load_config(Some(path.as_path())).unwrap();
        assert_eq!(options.mischief_delay, Duration::from_millis(2000));
        assert_eq!(options.dormant_delay, Duration::from_millis(6000));
        assert!(options.reduced_motion);
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imp.cfg");
        fs::write(&path, "mischiefDelayMs = 9000\ndormantDelayMs = 3000\n").unwrap();
        assert!(load_config(Some(path.as_path())).is_err());

        fs::write(&path, "tickMs = fast\n").unwrap();
        assert!(load_config(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(dir.path().join("missing.cfg").as_path())).is_err());
    }
}

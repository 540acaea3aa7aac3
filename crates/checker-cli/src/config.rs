//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [log]
//! format = "json"
//!
//! [checker]
//! timeout_ms = 30000
//! user_agent = "VLC/3.0.18 LibVLC/3.0.18"
//! parallel = 8
//! ffprobe_path = "/usr/local/bin/ffprobe"
//!
//! [output]
//! dir = "reports"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use checker_core::CheckerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub checker: CheckerDefaults,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckerDefaults {
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub parallel: Option<usize>,

    #[serde(default)]
    pub ffprobe_path: Option<String>,

    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

impl CheckerDefaults {
    pub fn to_checker_config(&self) -> CheckerConfig {
        let mut c = CheckerConfig::default();
        if let Some(v) = self.timeout_ms {
            c = c.with_timeout(v);
        }
        if let Some(ref v) = self.user_agent {
            c = c.with_user_agent(v.clone());
        }
        if let Some(v) = self.parallel {
            c = c.with_max_concurrent_checks(v);
        }
        if let Some(ref v) = self.ffprobe_path {
            c = c.with_probe_path(v.clone());
        }
        if let Some(v) = self.fetch_timeout_ms {
            c = c.with_fetch_timeout(v);
        }
        c
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("checker")
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        match self.log.format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(format!(
                    "Invalid log format '{}': must be 'pretty' or 'json'",
                    other
                ));
            }
        }

        if self.checker.timeout_ms == Some(0) {
            return Err("checker.timeout_ms must be greater than zero".into());
        }
        if self.checker.parallel == Some(0) {
            return Err("checker.parallel must be greater than zero".into());
        }
        if let Some(ref p) = self.checker.ffprobe_path {
            if p.trim().is_empty() {
                return Err("checker.ffprobe_path must not be empty".into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: AppConfig = toml::from_str("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.log.format, "pretty");
        assert_eq!(config.output.dir, PathBuf::from("checker"));

        let c = config.checker.to_checker_config();
        assert_eq!(c.timeout.as_millis(), 60_000);
        assert_eq!(c.probe_path, "ffprobe");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[log]
format = "json"

[checker]
timeout_ms = 15000
user_agent = "VLC/3.0"
parallel = 8
ffprobe_path = "/opt/bin/ffprobe"
fetch_timeout_ms = 5000

[output]
dir = "/var/lib/checker"
"#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.log.format, "json");
        assert_eq!(config.output.dir, PathBuf::from("/var/lib/checker"));

        let c = config.checker.to_checker_config();
        assert_eq!(c.timeout.as_millis(), 15_000);
        assert_eq!(c.user_agent.as_deref(), Some("VLC/3.0"));
        assert_eq!(c.max_concurrent_checks, 8);
        assert_eq!(c.probe_path, "/opt/bin/ffprobe");
        assert_eq!(c.fetch_timeout.as_millis(), 5_000);
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let config: AppConfig = toml::from_str("[log]\nformat = \"xml\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log format"), "{}", err);
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config: AppConfig = toml::from_str("[checker]\ntimeout_ms = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("timeout_ms"), "{}", err);
    }

    #[test]
    fn validate_rejects_zero_parallel() {
        let config: AppConfig = toml::from_str("[checker]\nparallel = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("parallel"), "{}", err);
    }

    #[test]
    fn validate_rejects_blank_ffprobe_path() {
        let config: AppConfig = toml::from_str("[checker]\nffprobe_path = \" \"\n").unwrap();
        assert!(config.validate().is_err());
    }
}

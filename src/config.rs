use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GmailError, Result};
use crate::policy::OnError;

/// Sentinel sender filter meaning "do not restrict by sender"
pub const ANYONE: &str = "anyone";

/// Marker label recording that a thread was auto-replied to
pub const DEFAULT_LABEL_NAME: &str = "AUTOMATED_REPLY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Sender address to watch, or "anyone"
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
        }
    }
}

/// Bounds, in seconds, of the random wait between two scans
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
        }
    }
}

impl ScheduleConfig {
    /// Short intervals for trying things out
    pub fn development() -> Self {
        Self {
            min_interval_secs: 10,
            max_interval_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_label_name")]
    pub label_name: String,
    #[serde(default = "default_body")]
    pub body: String,
    /// Address the reply to the original sender instead of copying From/To
    #[serde(default)]
    pub swap_addresses: bool,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            label_name: default_label_name(),
            body: default_body(),
            swap_addresses: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            on_error: OnError::default(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

fn default_sender() -> String {
    ANYONE.to_string()
}

fn default_min_interval() -> u64 {
    45
}

fn default_max_interval() -> u64 {
    120
}

fn default_label_name() -> String {
    DEFAULT_LABEL_NAME.to_string()
}

fn default_body() -> String {
    "This is an automated reply.\n\nI am on vacation. I will reply to your email when I get back.\n\nThanks"
        .to_string()
}

fn default_max_consecutive_failures() -> u32 {
    5
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    GmailError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scan.sender.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "scan.sender cannot be empty (use \"anyone\" to match all senders)".to_string(),
            ));
        }

        if self.schedule.min_interval_secs == 0 {
            return Err(GmailError::ConfigError(
                "schedule.min_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.schedule.min_interval_secs > self.schedule.max_interval_secs {
            return Err(GmailError::ConfigError(format!(
                "schedule.min_interval_secs ({}) cannot exceed schedule.max_interval_secs ({})",
                self.schedule.min_interval_secs, self.schedule.max_interval_secs
            )));
        }

        if self.reply.label_name.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "reply.label_name cannot be empty".to_string(),
            ));
        }
        if self.reply.label_name.contains('/') {
            return Err(GmailError::ConfigError(
                "reply.label_name cannot contain '/' character".to_string(),
            ));
        }
        if self.reply.body.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "reply.body cannot be empty".to_string(),
            ));
        }

        if self.policy.max_consecutive_failures == 0 {
            return Err(GmailError::ConfigError(
                "policy.max_consecutive_failures must be greater than 0".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        Self::default().save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.scan.sender, "anyone");
        assert_eq!(config.schedule.min_interval_secs, 45);
        assert_eq!(config.schedule.max_interval_secs, 120);
        assert_eq!(config.reply.label_name, "AUTOMATED_REPLY");
        assert!(config.reply.body.contains("I am on vacation"));
        assert!(!config.reply.swap_addresses);
        assert!(!config.execution.dry_run);
        assert_eq!(config.policy.on_error, OnError::Halt);
        assert_eq!(config.policy.max_consecutive_failures, 5);
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_development_schedule_is_valid() {
        let mut config = Config::default();
        config.schedule = ScheduleConfig::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.schedule.min_interval_secs, 10);
        assert_eq!(config.schedule.max_interval_secs, 15);
    }

    #[test]
    fn test_config_validation_empty_sender() {
        let mut config = Config::default();
        config.scan.sender = "  ".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("scan.sender"));
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = Config::default();
        config.schedule.min_interval_secs = 0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_config_validation_inverted_interval() {
        let mut config = Config::default();
        config.schedule.min_interval_secs = 121;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_config_validation_equal_interval_bounds() {
        let mut config = Config::default();
        config.schedule.min_interval_secs = 60;
        config.schedule.max_interval_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_label_name() {
        let mut config = Config::default();
        config.reply.label_name = "".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("label_name cannot be empty"));

        config.reply.label_name = "Auto/Reply".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("cannot contain '/'"));
    }

    #[test]
    fn test_config_validation_empty_body() {
        let mut config = Config::default();
        config.reply.body = "\n".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("reply.body"));
    }

    #[test]
    fn test_config_validation_zero_failures() {
        let mut config = Config::default();
        config.policy.max_consecutive_failures = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("max_consecutive_failures must be greater than 0"));
    }

    #[tokio::test]
    async fn test_config_load_save_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = Config::default();
        config.scan.sender = "boss@example.com".to_string();
        config.policy.on_error = OnError::ContinueOnTransient;
        config.save(path).await.unwrap();

        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.scan.sender, "boss@example.com");
        assert_eq!(loaded.policy.on_error, OnError::ContinueOnTransient);
        assert_eq!(loaded.reply.body, config.reply.body);
    }

    #[tokio::test]
    async fn test_config_load_nonexistent_returns_default() {
        let path = Path::new("/tmp/nonexistent-autoreply-config-12345.toml");
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.scan.sender, "anyone");
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "this is not valid toml {[}]")
            .await
            .unwrap();

        let result = Config::load(temp_file.path()).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_config_partial_with_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let partial_config = r#"
[schedule]
min_interval_secs = 30

[policy]
on_error = "continue_on_transient"

[execution]
dry_run = true
"#;
        tokio::fs::write(temp_file.path(), partial_config).await.unwrap();

        let config = Config::load(temp_file.path()).await.unwrap();

        assert_eq!(config.schedule.min_interval_secs, 30);
        assert_eq!(config.schedule.max_interval_secs, 120);
        assert_eq!(config.policy.on_error, OnError::ContinueOnTransient);
        assert!(config.execution.dry_run);
        assert_eq!(config.reply.label_name, "AUTOMATED_REPLY");
    }

    #[tokio::test]
    async fn test_config_load_rejects_invalid_values() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(
            temp_file.path(),
            "[schedule]\nmin_interval_secs = 200\nmax_interval_secs = 100\n",
        )
        .await
        .unwrap();

        assert!(Config::load(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_create_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_example(&path).await.unwrap();

        assert!(path.exists());
        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.schedule, ScheduleConfig::default());
    }
}

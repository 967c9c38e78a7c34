//! # Configuration Module
//!
//! Handles loading and validating gateway settings from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub collector: CollectorConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

/// Local event log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: String,

    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

/// Remote collector configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CollectorConfig {
    pub endpoint_url: String,

    pub device_id: String,

    #[serde(default = "default_device_type")]
    pub device_type: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,

    #[serde(default = "default_retry_limit_ms")]
    pub retry_limit_ms: u64,

    #[serde(default = "default_send_chunk_size")]
    pub send_chunk_size: usize,
}

/// Sensor allow list
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SensorConfig {
    /// Originator IDs (lowercase hex) whose telegrams produce events
    #[serde(default)]
    pub originator_ids: Vec<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57_600 }
fn default_reconnect_interval_ms() -> u64 { 1000 }

fn default_log_dir() -> String { "./logs".to_string() }
fn default_retention_days() -> i64 { 30 }

fn default_device_type() -> String { "enocean-gateway".to_string() }
fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_send_interval_ms() -> u64 { 10_000 }
fn default_retry_limit_ms() -> u64 { 600_000 }
fn default_send_chunk_size() -> usize { 50 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            retention_days: default_retention_days(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, TOML parsing fails, or
    /// validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("serial port cannot be empty"),
            ));
        }

        if self.serial.baud_rate == 0 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("baud_rate must be greater than 0"),
            ));
        }

        if self.serial.reconnect_interval_ms == 0 || self.serial.reconnect_interval_ms > 60_000 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("reconnect_interval_ms must be between 1 and 60000"),
            ));
        }

        if self.logging.directory.is_empty() {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("logging directory cannot be empty"),
            ));
        }

        if self.logging.retention_days <= 0 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("retention_days must be greater than 0"),
            ));
        }

        if self.collector.endpoint_url.is_empty() {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("collector endpoint_url cannot be empty"),
            ));
        }

        if self.collector.device_id.is_empty() {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("collector device_id cannot be empty"),
            ));
        }

        if self.collector.send_interval_ms == 0 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("send_interval_ms must be greater than 0"),
            ));
        }

        if self.collector.retry_limit_ms < self.collector.send_interval_ms {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("retry_limit_ms must be at least send_interval_ms"),
            ));
        }

        if self.collector.send_chunk_size == 0 {
            return Err(crate::error::BridgeError::Config(
                toml::de::Error::custom("send_chunk_size must be greater than 0"),
            ));
        }

        for id in &self.sensors.originator_ids {
            let valid = !id.is_empty()
                && id.len() % 2 == 0
                && id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
            if !valid {
                return Err(crate::error::BridgeError::Config(toml::de::Error::custom(
                    format!("originator id '{id}' is not lowercase hex"),
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            serial: SerialConfig::default(),
            logging: LoggingConfig::default(),
            collector: CollectorConfig {
                endpoint_url: "https://collector.example.com/api/v1/events".to_string(),
                device_id: "gateway-01".to_string(),
                device_type: default_device_type(),
                version: default_version(),
                send_interval_ms: default_send_interval_ms(),
                retry_limit_ms: default_retry_limit_ms(),
                send_chunk_size: default_send_chunk_size(),
            },
            sensors: SensorConfig {
                originator_ids: vec!["002e5c72".to_string()],
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_baud_rate() {
        let mut config = create_valid_config();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_interval_bounds() {
        let mut config = create_valid_config();
        config.serial.reconnect_interval_ms = 0;
        assert!(config.validate().is_err());

        config.serial.reconnect_interval_ms = 60_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir() {
        let mut config = create_valid_config();
        config.logging.directory = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nonpositive_retention() {
        let mut config = create_valid_config();
        config.logging.retention_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_endpoint_url() {
        let mut config = create_valid_config();
        config.collector.endpoint_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_limit_below_interval() {
        let mut config = create_valid_config();
        config.collector.retry_limit_ms = config.collector.send_interval_ms - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_originator_id() {
        for bad in ["", "xyz", "ABCD12", "123"] {
            let mut config = create_valid_config();
            config.sensors.originator_ids = vec![bad.to_string()];
            assert!(config.validate().is_err(), "id '{bad}' should be rejected");
        }
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB1"

[collector]
endpoint_url = "https://collector.example.com/api/v1/events"
device_id = "gateway-01"

[sensors]
originator_ids = ["002e5c72"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 57_600);
        assert_eq!(config.logging.retention_days, 30);
        assert_eq!(config.sensors.originator_ids, vec!["002e5c72"]);
    }

    #[test]
    fn test_load_config_missing_collector_fails() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[serial]\n").unwrap();
        temp_file.flush().unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }
}

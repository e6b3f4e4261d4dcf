use anyhow::Context as _;
use ptu::{ABS_MAX, SweepPattern};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration file: {source}")]
    ReadError { source: std::io::Error },

    #[error("Failed to parse configuration: {source}")]
    ParseError { source: toml::de::Error },

    #[error("Failed to serialize configuration: {source}")]
    SerializeError { source: toml::ser::Error },

    #[error("Failed to write configuration file: {source}")]
    WriteError { source: std::io::Error },

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.6".to_string(),
            port: 4000,
            connect_timeout_ms: 3000,
            write_timeout_ms: 1000,
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MotionConfig {
    /// Absolute tilt/pan bound used for sweep extremes.
    pub abs_max: i32,
    /// Pause between consecutive sweep commands.
    pub delay_ms: u64,
    /// Pause after power-on homing and before releasing the connection.
    pub settle_delay_ms: u64,
    pub pattern: SweepPattern,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            abs_max: ABS_MAX,
            delay_ms: 5000,
            settle_delay_ms: 5000,
            pattern: SweepPattern::Corners,
        }
    }
}

impl MotionConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub level: String,
    /// Daily rolling log files are written here when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GimbalConfig {
    pub connection: ConnectionConfig,
    pub motion: MotionConfig,
    pub logging: LoggingConfig,
}

impl GimbalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.connection.host.trim().is_empty() {
            Some("connection.host must not be empty")
        } else if self.connection.port == 0 {
            Some("connection.port must be non-zero")
        } else if self.connection.connect_timeout_ms == 0 {
            Some("connection.connect_timeout_ms must be positive")
        } else if self.connection.write_timeout_ms == 0 {
            Some("connection.write_timeout_ms must be positive")
        } else if self.motion.abs_max <= 0 {
            Some("motion.abs_max must be positive")
        } else if self.motion.delay_ms == 0 {
            Some("motion.delay_ms must be positive")
        } else if self.motion.settle_delay_ms == 0 {
            Some("motion.settle_delay_ms must be positive")
        } else {
            None
        };

        match problem {
            Some(message) => Err(ConfigError::ValidationError {
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct ConfigOptions {
    pub config_path: PathBuf,
    pub create_if_missing: bool,
}

pub const DEFAULT_CONFIG_PATH: &str = "default_config.toml";

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            create_if_missing: true,
        }
    }
}

impl ConfigOptions {
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    options: ConfigOptions,
}

impl ConfigManager {
    pub fn with_options(options: ConfigOptions) -> Self {
        Self { options }
    }

    pub fn path(&self) -> &Path {
        &self.options.config_path
    }

    pub fn load(&self) -> anyhow::Result<GimbalConfig> {
        let config_path = self.options.config_path.clone();

        if !config_path.exists() {
            if self.options.create_if_missing {
                let default_config = GimbalConfig::default();
                self.save(&default_config)
                    .context("Failed to save default config")?;
                eprintln!(
                    "Wrote default gimbal configuration ({}:{}) to {}",
                    default_config.connection.host,
                    default_config.connection.port,
                    config_path.display()
                );
                return Ok(default_config);
            } else {
                return Err(ConfigError::FileNotFound {
                    path: config_path.clone(),
                }
                .into());
            }
        }

        let content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError { source: e })?;

        let config: GimbalConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { source: e })?;

        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, config: &GimbalConfig) -> anyhow::Result<()> {
        let config_path = &self.options.config_path;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError { source: e })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError { source: e })?;

        fs::write(config_path, content).map_err(|e| ConfigError::WriteError { source: e })?;

        Ok(())
    }
}

pub fn init_config_with_options(
    options: ConfigOptions,
) -> anyhow::Result<(ConfigManager, GimbalConfig)> {
    let manager = ConfigManager::with_options(options);
    let config = manager.load()?;
    Ok((manager, config))
}

pub fn create_default_config<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    ConfigManager::with_options(ConfigOptions::with_path(path)).save(&GimbalConfig::default())
}

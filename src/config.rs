use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_VALIDATE_URL: &str = "http://localhost:8000/api/v1/auth/telegram/validate";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub enum ConfigError {
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "Invalid value {:?} for {}: {}", value, key, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    #[default]
    Production,
    Testing,
}

impl AppEnvironment {
    pub fn name(&self) -> &'static str {
        match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnvironment::Development),
            "production" | "prod" => Ok(AppEnvironment::Production),
            "testing" | "test" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Invalid {
                key: "APP_ENV",
                value: value.to_string(),
                reason: "expected development, production or testing".to_string(),
            }),
        }
    }
}

/// settings for one bootstrap controller, resolved once at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub validate_url: Url,
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
    pub environment: AppEnvironment,
    pub community_id: Option<i64>,
}

impl BootstrapConfig {
    pub fn new(validate_url: Url) -> Self {
        Self {
            validate_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            environment: AppEnvironment::default(),
            community_id: None,
        }
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_community_id(mut self, community_id: Option<i64>) -> Self {
        self.community_id = community_id;
        self
    }

    /// reads BOOTSTRAP_VALIDATE_URL, BOOTSTRAP_TIMEOUT_SECS, APP_ENV and BOOTSTRAP_COMMUNITY_ID
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url =
            lookup("BOOTSTRAP_VALIDATE_URL").unwrap_or_else(|| DEFAULT_VALIDATE_URL.to_string());
        let validate_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::Invalid {
            key: "BOOTSTRAP_VALIDATE_URL",
            value: raw_url.clone(),
            reason: e.to_string(),
        })?;
        let mut config = Self::new(validate_url);

        if let Some(raw) = lookup("BOOTSTRAP_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "BOOTSTRAP_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: "expected a positive number of seconds".to_string(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup("APP_ENV") {
            config.environment = AppEnvironment::parse(&raw)?;
        }

        if let Some(raw) = lookup("BOOTSTRAP_COMMUNITY_ID") {
            let id = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                key: "BOOTSTRAP_COMMUNITY_ID",
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            config.community_id = Some(id);
        }

        info!(
            "Bootstrap config: endpoint={}, timeout={}s, environment={}",
            config.validate_url,
            config.timeout.as_secs(),
            config.environment.name()
        );

        Ok(config)
    }

    /// development fallbacks are only reachable in debug builds
    pub fn dev_fallbacks(&self) -> bool {
        cfg!(debug_assertions) && self.environment == AppEnvironment::Development
    }
}

mod timeout_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

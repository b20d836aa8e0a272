use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct HostelConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub billing: BillingConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Day of the billing month on which invoices fall due (1..=28).
    pub due_day: u32,
    /// Run the generator on a timer for the current month.
    pub auto_generate: bool,
    pub schedule_interval_secs: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            due_day: 10,
            auto_generate: false,
            schedule_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Mongo => "mongo",
            StoreBackend::Memory => "memory",
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

impl HostelConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let is_prod = common.is_production();

        let store: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if is_prod && store == StoreBackend::Memory {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STORE_BACKEND=memory is not allowed in production"
            )));
        }

        // The URI is only mandatory when Mongo is actually used.
        let uri_default = match store {
            StoreBackend::Memory => Some("mongodb://localhost:27017"),
            StoreBackend::Mongo => None,
        };

        let due_day: u32 = parse_env("BILLING_DUE_DAY", 10)?;
        if !(1..=28).contains(&due_day) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "BILLING_DUE_DAY must be between 1 and 28, got {}",
                due_day
            )));
        }

        Ok(HostelConfig {
            common,
            store,
            mongodb: MongoConfig {
                uri: Secret::new(get_env("MONGODB_URI", uri_default, is_prod)?),
                database: get_env("MONGODB_DATABASE", Some("hostelite"), false)?,
            },
            billing: BillingConfig {
                due_day,
                auto_generate: parse_env("BILLING_AUTO_GENERATE", false)?,
                schedule_interval_secs: parse_env("BILLING_SCHEDULE_INTERVAL_SECS", 3600)?,
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }

    /// In-memory configuration on a random port, used by tests and local demos.
    pub fn in_memory() -> Self {
        Self {
            common: core_config::Config {
                port: 0,
                ..Default::default()
            },
            store: StoreBackend::Memory,
            mongodb: MongoConfig {
                uri: Secret::new("mongodb://localhost:27017".to_string()),
                database: "hostelite".to_string(),
            },
            billing: BillingConfig::default(),
            otlp_endpoint: None,
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod && default.is_none() {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parsing() {
        assert_eq!("mongo".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_in_memory_defaults() {
        let config = HostelConfig::in_memory();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.common.port, 0);
        assert_eq!(config.billing.due_day, 10);
        assert!(!config.billing.auto_generate);
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: u64 = parse_env("HOSTEL_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}

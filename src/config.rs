use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DB_NAME: &str = "assessment_db";
const DEFAULT_COLLECTION_NAME: &str = "employees";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value {:?} for {}", self.value, self.key)
    }
}

impl std::error::Error for ConfigError {}

/// Connection settings for the document store.
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Upper bound for connecting, server selection and each store call.
    pub timeout: Duration,
    pub max_pool_size: Option<u32>,
}

impl Default for MongoSettings {
    fn default() -> Self {
        MongoSettings {
            uri: DEFAULT_MONGODB_URI.to_string(),
            database: DEFAULT_DB_NAME.to_string(),
            collection: DEFAULT_COLLECTION_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_pool_size: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: String,
    pub mongo: MongoSettings,
}

impl Settings {
    /// Reads settings from the process environment. Call `dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MongoSettings::default();

        let timeout = match lookup("MONGODB_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("MONGODB_TIMEOUT_SECS", raw)?),
            None => defaults.timeout,
        };
        let max_pool_size = lookup("MONGODB_MAX_POOL_SIZE")
            .map(|raw| parse_number("MONGODB_MAX_POOL_SIZE", raw))
            .transpose()?;

        Ok(Settings {
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            mongo: MongoSettings {
                uri: lookup("MONGODB_URI").unwrap_or(defaults.uri),
                database: lookup("DB_NAME").unwrap_or(defaults.database),
                collection: lookup("COLLECTION_NAME").unwrap_or(defaults.collection),
                timeout,
                max_pool_size,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError { key, value: raw })
}

use std::{str::FromStr, time::Duration};

use slping::{AddressError, ServerAddress};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub hosts: Vec<ServerAddress>,
    pub refresh_interval: Duration,
    pub query_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("invalid address in HOSTS: {0}")]
    InvalidHost(#[from] AddressError),
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    lookup(var).map_or(Ok(default), |value| {
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value })
    })
}

fn nonzero_millis(var: &'static str, millis: u64) -> Result<Duration, ConfigError> {
    if millis == 0 {
        return Err(ConfigError::Zero(var));
    }
    Ok(Duration::from_millis(millis))
}

impl Config {
    /// Reads `PORT`, `HOSTS`, `REFRESH_SECS` and `QUERY_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_var(&lookup, "PORT", DEFAULT_PORT)?;
        let refresh_secs = parse_var(&lookup, "REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        let timeout_ms = parse_var(&lookup, "QUERY_TIMEOUT_MS", DEFAULT_QUERY_TIMEOUT_MS)?;
        let hosts = lookup("HOSTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(ServerAddress::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            port,
            hosts,
            refresh_interval: nonzero_millis("REFRESH_SECS", refresh_secs.saturating_mul(1000))?,
            query_timeout: nonzero_millis("QUERY_TIMEOUT_MS", timeout_ms)?,
        })
    }
}

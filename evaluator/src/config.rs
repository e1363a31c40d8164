use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::app::{
    ClientInfo, PipelineConfig, QueryClientConfig, RetryConfig, DEFAULT_BATCH_SIZE,
    MAX_BATCH_SIZE, SAFE_BROWSING_URL,
};
use crate::domain::entities::ThreatType;
use crate::error::ConfigError;

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub endpoint: String,
    pub client_id: String,
    pub client_version: String,
    pub threat_types: Vec<ThreatType>,
    /// Flush threshold per processing unit (at most 500)
    pub batch_size: usize,
    pub workers: usize,
    pub request_timeout: Duration,
    /// Retries after the first attempt
    pub retry_max_attempts: u32,
    pub retry_initial_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup; `from_env` uses the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("SAFE_BROWSING_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::Missing("SAFE_BROWSING_API_KEY"))?;

        let threat_types = match lookup("SAFE_BROWSING_THREAT_TYPES") {
            Some(raw) => parse_threat_types(&raw)?,
            None => ThreatType::defaults(),
        };

        let batch_size = parse_or(&lookup, "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchSize {
                value: batch_size,
                max: MAX_BATCH_SIZE,
            });
        }

        let workers: usize = parse_or(&lookup, "WORKER_COUNT", 4)?;
        if workers == 0 {
            return Err(ConfigError::Invalid {
                name: "WORKER_COUNT",
                value: "0".to_string(),
            });
        }

        let retry_initial_delay =
            Duration::from_millis(parse_or(&lookup, "RETRY_INITIAL_DELAY_MS", 500)?);
        let retry_max_delay =
            Duration::from_millis(parse_or(&lookup, "RETRY_MAX_DELAY_MS", 10_000)?);
        if retry_initial_delay > retry_max_delay {
            return Err(ConfigError::Invalid {
                name: "RETRY_INITIAL_DELAY_MS",
                value: format!(
                    "{} (exceeds RETRY_MAX_DELAY_MS {})",
                    retry_initial_delay.as_millis(),
                    retry_max_delay.as_millis()
                ),
            });
        }

        Ok(Self {
            api_key,
            endpoint: lookup("SAFE_BROWSING_URL").unwrap_or_else(|| SAFE_BROWSING_URL.to_string()),
            client_id: lookup("SAFE_BROWSING_CLIENT_ID")
                .unwrap_or_else(|| "domainregistry".to_string()),
            client_version: lookup("SAFE_BROWSING_CLIENT_VERSION")
                .unwrap_or_else(|| "0.0.1".to_string()),
            threat_types,
            batch_size,
            workers,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            retry_max_attempts: parse_or(&lookup, "RETRY_MAX_ATTEMPTS", 3)?,
            retry_initial_delay,
            retry_max_delay,
        })
    }

    pub fn query_client(&self) -> QueryClientConfig {
        QueryClientConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            client: ClientInfo {
                client_id: self.client_id.clone(),
                client_version: self.client_version.clone(),
            },
            threat_types: self.threat_types.clone(),
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            initial_delay: self.retry_initial_delay,
            max_delay: self.retry_max_delay,
            ..RetryConfig::default()
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            batch_size: self.batch_size,
            ..PipelineConfig::default()
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_version", &self.client_version)
            .field("threat_types", &self.threat_types)
            .field("batch_size", &self.batch_size)
            .field("workers", &self.workers)
            .field("request_timeout", &self.request_timeout)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .finish()
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

fn parse_threat_types(raw: &str) -> Result<Vec<ThreatType>, ConfigError> {
    let types: Vec<ThreatType> = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if types.is_empty() {
        return Err(ConfigError::Invalid {
            name: "SAFE_BROWSING_THREAT_TYPES",
            value: raw.to_string(),
        });
    }
    Ok(types)
}

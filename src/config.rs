use crate::engine::{BucketDurations, SnapshotPolicy};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Ethereum JSON-RPC endpoint used for contract reads.
    pub rpc_url: String,
    pub snapshot_policy: SnapshotPolicy,
    pub bucket_durations: BucketDurations,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let snapshot_policy = match env_map.get("SNAPSHOT_POLICY") {
            Some(raw) => SnapshotPolicy::from_str(raw).map_err(|_| {
                ConfigError::InvalidValue(
                    "SNAPSHOT_POLICY".to_string(),
                    format!("must be independent or first_match, got {}", raw),
                )
            })?,
            None => SnapshotPolicy::default(),
        };

        let defaults = BucketDurations::default();
        let bucket_durations = BucketDurations {
            hourly: parse_seconds(&env_map, "HOURLY_SECONDS", defaults.hourly)?,
            daily: parse_seconds(&env_map, "DAILY_SECONDS", defaults.daily)?,
            weekly: parse_seconds(&env_map, "WEEKLY_SECONDS", defaults.weekly)?,
        };

        Ok(Config {
            port,
            database_path,
            rpc_url,
            snapshot_policy,
            bucket_durations,
        })
    }
}

fn parse_seconds(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive number of seconds".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("RPC_URL".to_string(), "http://localhost:8545".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.snapshot_policy, SnapshotPolicy::Independent);
        assert_eq!(config.bucket_durations, BucketDurations::default());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_rpc_url() {
        let mut env_map = setup_required_env();
        env_map.remove("RPC_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "RPC_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_snapshot_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("SNAPSHOT_POLICY".to_string(), "first_match".to_string());
        let config = Config::from_env_map(env_map.clone()).unwrap();
        assert_eq!(config.snapshot_policy, SnapshotPolicy::FirstMatch);

        env_map.insert("SNAPSHOT_POLICY".to_string(), "whenever".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SNAPSHOT_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_bucket_durations() {
        let mut env_map = setup_required_env();
        env_map.insert("HOURLY_SECONDS".to_string(), "60".to_string());
        let config = Config::from_env_map(env_map.clone()).unwrap();
        assert_eq!(config.bucket_durations.hourly, 60);
        assert_eq!(config.bucket_durations.daily, 86_400);

        env_map.insert("WEEKLY_SECONDS".to_string(), "0".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "WEEKLY_SECONDS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}

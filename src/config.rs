use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// Point economy used by polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsConfig {
    /// Balance given to new accounts
    pub starting_points: i32,
    /// Charged to the author when a poll is created
    pub poll_creation_cost: i32,
    /// Paid to a voter for each vote cast
    pub vote_reward: i32,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub http_port: u16,
    pub chat_port: Option<u16>,
    pub environment: String,
    pub token_ttl_hours: i64,
    pub points: PointsConfig,
    pub audit_log_dir: PathBuf,
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl DatabaseConfig {
    /// Create database config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let url = lookup("DATABASE_URL")
            .ok_or("DATABASE_URL environment variable is required")?;

        let max_connections = parse_or(lookup, "DATABASE_MAX_CONNECTIONS", 10u32);
        let acquire_timeout_secs = parse_or(lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64);
        let idle_timeout_secs = parse_or(lookup, "DATABASE_IDLE_TIMEOUT_SECS", 600u64); // 10 minutes
        let max_lifetime_secs = parse_or(lookup, "DATABASE_MAX_LIFETIME_SECS", 1800u64); // 30 minutes
        let test_before_acquire = parse_or(lookup, "DATABASE_TEST_BEFORE_ACQUIRE", true);

        // Validate configuration
        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/barter".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            starting_points: 100,
            poll_creation_cost: 5,
            vote_reward: 1,
        }
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Build the config from any key lookup (the process environment in production)
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database = DatabaseConfig::from_lookup(lookup)?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT")
            .unwrap_or_else(|| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => return Err(format!("Invalid LOG_FORMAT: {}. Must be pretty or json", other)),
        };

        let http_port = parse_or(lookup, "HTTP_PORT", 8080u16);

        let chat_port = lookup("CHAT_PORT").and_then(|s| s.trim().parse::<u16>().ok());

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let token_ttl_hours = parse_or(lookup, "TOKEN_TTL_HOURS", 168i64); // one week

        let defaults = PointsConfig::default();
        let points = PointsConfig {
            starting_points: parse_or(lookup, "STARTING_POINTS", defaults.starting_points),
            poll_creation_cost: parse_or(lookup, "POLL_CREATION_COST", defaults.poll_creation_cost),
            vote_reward: parse_or(lookup, "VOTE_REWARD", defaults.vote_reward),
        };

        let audit_log_dir =
            PathBuf::from(lookup("AUDIT_LOG_DIR").unwrap_or_else(|| "./logs".to_string()));

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        if token_ttl_hours <= 0 {
            return Err("TOKEN_TTL_HOURS must be greater than 0".to_string());
        }

        if points.starting_points < 0 || points.poll_creation_cost < 0 || points.vote_reward < 0 {
            return Err("Point settings must not be negative".to_string());
        }

        if chat_port == Some(http_port) {
            return Err("CHAT_PORT must differ from HTTP_PORT".to_string());
        }

        Ok(Self {
            database,
            log_level: log_level.to_lowercase(),
            log_format,
            http_port,
            chat_port,
            environment: environment.to_lowercase(),
            token_ttl_hours,
            points,
            audit_log_dir,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Bearer token lifetime
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            http_port: 8080,
            chat_port: None,
            environment: "development".to_string(),
            token_ttl_hours: 168,
            points: PointsConfig::default(),
            audit_log_dir: PathBuf::from("./logs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert_eq!(config.points.vote_reward, 1);
    }

    #[test]
    fn test_database_url_is_required() {
        let err = AppConfig::from_lookup(&lookup_from(&[])).unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = AppConfig::from_lookup(&lookup_from(&[
            ("DATABASE_URL", "postgresql://db/barter"),
            ("HTTP_PORT", "9000"),
            ("CHAT_PORT", "9001"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FORMAT", "json"),
            ("POLL_CREATION_COST", "12"),
            ("ENVIRONMENT", "Production"),
        ]))
        .unwrap();

        assert_eq!(config.database.url, "postgresql://db/barter");
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.chat_port, Some(9001));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.points.poll_creation_cost, 12);
        assert!(config.is_production());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = [("DATABASE_URL", "postgresql://db/barter")];

        let mut bad_level = base.to_vec();
        bad_level.push(("LOG_LEVEL", "loud"));
        assert!(AppConfig::from_lookup(&lookup_from(&bad_level)).is_err());

        let mut same_ports = base.to_vec();
        same_ports.push(("HTTP_PORT", "7000"));
        same_ports.push(("CHAT_PORT", "7000"));
        assert!(AppConfig::from_lookup(&lookup_from(&same_ports)).is_err());

        let mut zero_pool = base.to_vec();
        zero_pool.push(("DATABASE_MAX_CONNECTIONS", "0"));
        assert!(AppConfig::from_lookup(&lookup_from(&zero_pool)).is_err());
    }
}

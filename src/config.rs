use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "./data/cross_stitch_tracker.db";
pub const DEFAULT_APP_NAME: &str = "Cross-Stitch Tracker";

/// Seven days.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub database_path: String,
    pub app_name: String,
    pub cookie_secure: bool,
    pub session_ttl_secs: i64,
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8000,
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            cookie_secure: false,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let port = match env_map.get("PORT") {
            Some(s) => s.parse::<u16>().map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?,
            None => defaults.port,
        };

        let bind_addr = match env_map.get("BIND_ADDR") {
            Some(s) => s.parse::<IpAddr>().map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?,
            None => defaults.bind_addr,
        };

        let database_path = env_map
            .get("DATABASE_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.database_path);

        let app_name = env_map
            .get("APP_NAME")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.app_name);

        let cookie_secure = parse_bool(&env_map, "COOKIE_SECURE", defaults.cookie_secure)?;
        let debug = parse_bool(&env_map, "DEBUG", defaults.debug)?;

        let session_ttl_secs = match env_map.get("SESSION_TTL_SECS") {
            Some(s) => s
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_TTL_SECS".to_string(),
                        "must be a positive integer".to_string(),
                    )
                })?,
            None => defaults.session_ttl_secs,
        };

        Ok(Config {
            port,
            bind_addr,
            database_path,
            app_name,
            cookie_secure,
            session_ttl_secs,
            debug,
        })
    }
}

fn parse_bool(
    env_map: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be true or false, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.app_name, "Cross-Stitch Tracker");
        assert!(!config.cookie_secure);
        assert_eq!(config.session_ttl_secs, 604800);
    }

    #[test]
    fn test_overrides() {
        let mut env_map = HashMap::new();
        env_map.insert("PORT".to_string(), "9090".to_string());
        env_map.insert("DATABASE_PATH".to_string(), "/tmp/x.db".to_string());
        env_map.insert("COOKIE_SECURE".to_string(), "TRUE".to_string());
        env_map.insert("BIND_ADDR".to_string(), "0.0.0.0".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_path, "/tmp/x.db");
        assert!(config.cookie_secure);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0");
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = HashMap::new();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_cookie_secure() {
        let mut env_map = HashMap::new();
        env_map.insert("COOKIE_SECURE".to_string(), "maybe".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "COOKIE_SECURE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_session_ttl() {
        let mut env_map = HashMap::new();
        env_map.insert("SESSION_TTL_SECS".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SESSION_TTL_SECS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}

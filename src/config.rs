// Runtime configuration from the environment
//
// OSINTRANET_DB          SQLite file (default osintranet.db)
// OSINTRANET_BIND        server address (default 127.0.0.1:3000)
// OSINTRANET_LOG_FORMAT  plain, pretty or json (default plain)

use crate::logging::LogFormat;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

pub const DB_VAR: &str = "OSINTRANET_DB";
pub const BIND_VAR: &str = "OSINTRANET_BIND";
pub const LOG_FORMAT_VAR: &str = "OSINTRANET_LOG_FORMAT";

const DEFAULT_DB: &str = "osintranet.db";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind: String,
    pub log_format: LogFormat,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset or invalid values fall back to the defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path: String = try_load(&lookup, DB_VAR, DEFAULT_DB.to_string());
        Self {
            db_path: PathBuf::from(db_path),
            bind: try_load(&lookup, BIND_VAR, DEFAULT_BIND.to_string()),
            log_format: try_load(&lookup, LOG_FORMAT_VAR, LogFormat::default()),
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(value) => value.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {value}: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.db_path, PathBuf::from("osintranet.db"));
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Plain);
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let config = config(&[
            (DB_VAR, "/var/lib/osintranet/data.db"),
            (BIND_VAR, " 0.0.0.0:8080 "),
            (LOG_FORMAT_VAR, "yaml"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/osintranet/data.db"));
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Plain);
    }
}

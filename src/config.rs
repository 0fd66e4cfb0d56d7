//! Node configuration from the environment.
//!
//! `Config::from_env()` loads a `.env` file if present and then reads:
//! - `HOST`, `PORT` - listen address (127.0.0.1:8080)
//! - `LEDGER_BASE_DIFFICULTY`, `LEDGER_REDUCED_DIFFICULTY` - leading zero hex digits (4 / 1)
//! - `LEDGER_MAX_ATTEMPTS` - nonce cap per search
//! - `LEDGER_SEARCH_TIMEOUT_MS` - optional wall-clock cap per search
//! - `LEDGER_ORACLE_TIMEOUT_MS`, `LEDGER_LOCATION_TIMEOUT_MS` - collaborator bounds (2000)
//! - `LEDGER_LOCATION` - static location tag
//! - `LEDGER_ORACLE_CMD` - classifier command line; unset means no relaxed difficulty
//! - `LEDGER_BLOCK_MAX_TXS` - records per block (100)

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::blockchain::{
    DEFAULT_BASE_DIFFICULTY, DEFAULT_BLOCK_MAX_TXS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REDUCED_DIFFICULTY, DifficultyPolicy, Miner, SearchLimit, UNKNOWN_LOCATION,
};
use crate::providers::{
    CommandOracle, DenyAll, EvidenceOracle, LocationProvider, StaticLocation, Timed,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub policy: DifficultyPolicy,
    pub max_attempts: u64,
    pub search_timeout: Option<Duration>,
    pub oracle_timeout: Duration,
    pub location_timeout: Duration,
    pub location: Option<String>,
    pub oracle_command: Option<String>,
    pub block_max_txs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            policy: DifficultyPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            search_timeout: None,
            oracle_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            location_timeout: Duration::from_millis(DEFAULT_COLLABORATOR_TIMEOUT_MS),
            location: None,
            oracle_command: None,
            block_max_txs: DEFAULT_BLOCK_MAX_TXS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present, ignore errors
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let base = parse_or(&get, "LEDGER_BASE_DIFFICULTY", DEFAULT_BASE_DIFFICULTY)?;
        let reduced = parse_or(&get, "LEDGER_REDUCED_DIFFICULTY", DEFAULT_REDUCED_DIFFICULTY)?;
        let policy = DifficultyPolicy::new(base, reduced).map_err(|e| ConfigError(e.to_string()))?;

        let block_max_txs = parse_or(&get, "LEDGER_BLOCK_MAX_TXS", DEFAULT_BLOCK_MAX_TXS)?;
        if block_max_txs == 0 {
            return Err(ConfigError("LEDGER_BLOCK_MAX_TXS must be at least 1".into()));
        }

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", DEFAULT_PORT)?,
            policy,
            max_attempts: parse_or(&get, "LEDGER_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            search_timeout: match get("LEDGER_SEARCH_TIMEOUT_MS") {
                Some(_) => Some(millis(&get, "LEDGER_SEARCH_TIMEOUT_MS", 0)?),
                None => None,
            },
            oracle_timeout: millis(&get, "LEDGER_ORACLE_TIMEOUT_MS", DEFAULT_COLLABORATOR_TIMEOUT_MS)?,
            location_timeout: millis(
                &get,
                "LEDGER_LOCATION_TIMEOUT_MS",
                DEFAULT_COLLABORATOR_TIMEOUT_MS,
            )?,
            location: get("LEDGER_LOCATION").map(|s| s.trim().to_string()),
            oracle_command: get("LEDGER_ORACLE_CMD"),
            block_max_txs,
        })
    }

    pub fn search_limit(&self) -> SearchLimit {
        let limit = SearchLimit::attempts(self.max_attempts);
        match self.search_timeout {
            Some(t) => limit.with_timeout(t),
            None => limit,
        }
    }

    /// Wire the configured collaborators into a [`Miner`].
    pub fn miner(&self) -> Miner {
        let oracle: Arc<dyn EvidenceOracle> = match self
            .oracle_command
            .as_deref()
            .and_then(CommandOracle::from_command_line)
        {
            Some(cmd) => Arc::new(cmd.with_timeout(self.oracle_timeout)),
            None => Arc::new(DenyAll),
        };
        let tag = self.location.clone().unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let location: Arc<dyn LocationProvider> =
            Arc::new(Timed::new(StaticLocation::new(tag), self.location_timeout));
        Miner::new(oracle, location, self.search_limit(), self.block_max_txs)
    }
}

fn parse_or<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError(format!("failed to parse {key}='{raw}': {e}"))),
        None => Ok(default),
    }
}

fn millis<G>(get: &G, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.policy, DifficultyPolicy::default());
        assert_eq!(cfg.search_timeout, None);
        assert_eq!(cfg.block_max_txs, 100);
        assert!(cfg.oracle_command.is_none());
    }

    #[test]
    fn values_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("LEDGER_BASE_DIFFICULTY", "3"),
            ("LEDGER_REDUCED_DIFFICULTY", "2"),
            ("LEDGER_SEARCH_TIMEOUT_MS", "1500"),
            ("LEDGER_LOCATION", " Lisbon "),
            ("LEDGER_ORACLE_CMD", "   "),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!((cfg.policy.base(), cfg.policy.reduced()), (3, 2));
        assert_eq!(cfg.search_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cfg.search_limit().timeout, Some(Duration::from_millis(1500)));
        assert_eq!(cfg.location.as_deref(), Some("Lisbon"));
        assert!(cfg.oracle_command.is_none());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(Config::from_lookup(lookup(&[("LEDGER_REDUCED_DIFFICULTY", "9")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LEDGER_BLOCK_MAX_TXS", "0")])).is_err());
    }
}

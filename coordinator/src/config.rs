//! Coordinator configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use selfproof_explorer::{ExplorerClient, ExplorerError, DEFAULT_EXPLORER_URL};
use selfproof_store::RecordStore;
use selfproof_trust::{MetricsPolicy, TrustLedger};
use selfproof_types::Amount;
use selfproof_utils::LogFormat;
use selfproof_watcher::WatchConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Configuration for a verification coordinator.
///
/// Can be loaded from a TOML file via [`CoordinatorConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Amounts are in base units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Seconds between ledger polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Polls before a watch times out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Accepted distance from the expected amount (exclusive).
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: Amount,

    /// Recent transactions requested per poll.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Self-payment amount that unlocks gated content.
    #[serde(default = "default_unlock_fee")]
    pub unlock_fee: Amount,

    /// Block-explorer REST endpoint.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    /// How new records get `blue_score` and `dag_depth`.
    #[serde(default)]
    pub metrics_policy: MetricsPolicy,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_max_attempts() -> u32 {
    200
}

fn default_amount_tolerance() -> Amount {
    Amount::from_cents(1)
}

fn default_fetch_limit() -> usize {
    20
}

fn default_unlock_fee() -> Amount {
    Amount::from_native(1)
}

fn default_explorer_url() -> String {
    DEFAULT_EXPLORER_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl CoordinatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("CoordinatorConfig is always serializable to TOML")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.poll_interval_secs == 0 {
            return invalid("poll_interval_secs", "must be at least 1");
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts", "must be at least 1");
        }
        if self.fetch_limit == 0 {
            return invalid("fetch_limit", "must be at least 1");
        }
        if self.amount_tolerance.is_zero() {
            return invalid("amount_tolerance", "a zero tolerance never matches");
        }
        if self.unlock_fee.is_zero() {
            return invalid("unlock_fee", "must be positive");
        }
        Ok(())
    }

    /// Polling parameters for the watcher.
    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.max_attempts,
            tolerance: self.amount_tolerance,
            fetch_limit: self.fetch_limit,
        }
    }

    /// A trust ledger over `store` computing metrics with the configured policy.
    pub fn trust_ledger(&self, store: Arc<dyn RecordStore>) -> TrustLedger {
        TrustLedger::new(store, self.metrics_policy)
    }

    pub fn explorer_client(&self) -> Result<ExplorerClient, ExplorerError> {
        ExplorerClient::new(&self.explorer_url)
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> bool {
        selfproof_utils::init_logging(self.log_format, &self.log_level)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_attempts: default_max_attempts(),
            amount_tolerance: default_amount_tolerance(),
            fetch_limit: default_fetch_limit(),
            unlock_fee: default_unlock_fee(),
            explorer_url: default_explorer_url(),
            metrics_policy: MetricsPolicy::default(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = CoordinatorConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = CoordinatorConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = CoordinatorConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.poll_interval_secs, 3);
        assert_eq!(config.max_attempts, 200);
        assert_eq!(config.amount_tolerance.base_units(), 1_000_000);
        assert_eq!(config.unlock_fee, Amount::from_native(1));
        assert_eq!(config.metrics_policy, MetricsPolicy::Inert);
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            poll_interval_secs = 5
            max_attempts = 10
            metrics_policy = "parent-depth"
            log_format = "json"
        "#;
        let config = CoordinatorConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.metrics_policy, MetricsPolicy::ParentDepth);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.fetch_limit, 20); // default
    }

    #[test]
    fn watch_config_mirrors_settings() {
        let config = CoordinatorConfig::default();
        let watch = config.watch_config();
        assert_eq!(watch.poll_interval, Duration::from_secs(3));
        assert_eq!(watch.budget(), Duration::from_secs(600));
        assert_eq!(watch.tolerance, config.amount_tolerance);
    }

    #[test]
    fn zero_values_are_rejected() {
        for toml in [
            "poll_interval_secs = 0",
            "max_attempts = 0",
            "fetch_limit = 0",
            "amount_tolerance = 0",
        ] {
            assert!(matches!(
                CoordinatorConfig::from_toml_str(toml),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn trust_ledger_uses_configured_policy() {
        let config = CoordinatorConfig::from_toml_str(r#"metrics_policy = "parent-depth""#)
            .expect("should parse");
        let ledger = config.trust_ledger(Arc::new(selfproof_nullables::NullStore::new()));
        assert_eq!(ledger.policy(), MetricsPolicy::ParentDepth);
    }

    #[test]
    fn missing_file_returns_read_error() {
        let result = CoordinatorConfig::from_toml_file("/nonexistent/selfproof.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}

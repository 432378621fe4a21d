//! Query configuration.
//!
//! Business defaults the repositories apply when a request leaves something
//! unspecified. Loaded from `TALLY_*` environment variables with fallback to
//! defaults, then injected into every repository at construction.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use tally_core::{OrderSource, DEFAULT_ACTIVE_STATES};

/// Reporting defaults shared by every repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// States listed when a request has no state filter
    pub active_states: Vec<i64>,

    /// Source every list is restricted to (`None` lists all sources)
    pub list_order_source: Option<i64>,

    /// Refund payment method id that marks an aggregated refund payment
    pub aggregated_refund_method_id: i64,

    /// Prefix for amounts on detail screens
    pub currency_symbol: String,

    /// Joins payment method names in list rows
    pub channel_separator: String,

    /// Joins `¥amount(method)` entries in the detail header
    pub payment_line_separator: String,

    /// Largest page a list request may ask for
    pub max_page_size: u32,

    /// Upper bound for one repository operation
    pub query_timeout: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            active_states: DEFAULT_ACTIVE_STATES.to_vec(),
            list_order_source: Some(OrderSource::StoreCashier.code()),
            aggregated_refund_method_id: -1,
            currency_symbol: "¥".to_string(),
            channel_separator: ", ".to_string(),
            payment_line_separator: "; ".to_string(),
            max_page_size: 100,
            query_timeout: Duration::from_secs(30),
        }
    }
}

impl QueryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup (environment, file, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = QueryConfig::default();

        let active_states = match lookup("TALLY_ACTIVE_STATES") {
            Some(raw) => parse_id_list("TALLY_ACTIVE_STATES", &raw)?,
            None => defaults.active_states,
        };

        let list_order_source = match lookup("TALLY_LIST_ORDER_SOURCE") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("all") => None,
            Some(raw) => Some(parse_value("TALLY_LIST_ORDER_SOURCE", &raw)?),
            None => defaults.list_order_source,
        };

        let config = QueryConfig {
            active_states,
            list_order_source,
            aggregated_refund_method_id: match lookup("TALLY_AGGREGATED_REFUND_METHOD_ID") {
                Some(raw) => parse_value("TALLY_AGGREGATED_REFUND_METHOD_ID", &raw)?,
                None => defaults.aggregated_refund_method_id,
            },
            currency_symbol: lookup("TALLY_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
            channel_separator: lookup("TALLY_CHANNEL_SEPARATOR").unwrap_or(defaults.channel_separator),
            payment_line_separator: lookup("TALLY_PAYMENT_LINE_SEPARATOR")
                .unwrap_or(defaults.payment_line_separator),
            max_page_size: match lookup("TALLY_MAX_PAGE_SIZE") {
                Some(raw) => parse_value("TALLY_MAX_PAGE_SIZE", &raw)?,
                None => defaults.max_page_size,
            },
            query_timeout: match lookup("TALLY_QUERY_TIMEOUT_SECS") {
                Some(raw) => Duration::from_secs(parse_value("TALLY_QUERY_TIMEOUT_SECS", &raw)?),
                None => defaults.query_timeout,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks invariants the repositories rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active_states.is_empty() {
            return Err(ConfigError::InvalidValue("TALLY_ACTIVE_STATES".to_string()));
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::InvalidValue("TALLY_MAX_PAGE_SIZE".to_string()));
        }
        if self.query_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("TALLY_QUERY_TIMEOUT_SECS".to_string()));
        }
        Ok(())
    }

    pub fn active_states(mut self, states: Vec<i64>) -> Self {
        self.active_states = states;
        self
    }

    pub fn list_order_source(mut self, source: Option<i64>) -> Self {
        self.list_order_source = source;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max;
        self
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn parse_id_list(key: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_value(key, part))
        .collect()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

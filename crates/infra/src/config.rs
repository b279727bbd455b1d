//! Ledger configuration: defaults, then an optional TOML file, then `BOOKSMITH__*`
//! environment variables.

use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use booksmith_accounting::{
    BalancePolicy, ChartOfAccounts, EntryStatus, SequenceDefaults, SequenceSettings,
};
use booksmith_core::BALANCE_TOLERANCE;
use booksmith_observability::LogSettings;

use crate::outbox::FailurePolicy;

pub const ENV_PREFIX: &str = "BOOKSMITH";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub chart: ChartOfAccounts,
    pub posting: PostingConfig,
    pub sequences: SequencesConfig,
    pub database: DatabaseConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    /// Status new entries are stored with. `posted` auto-approves.
    pub initial_status: EntryStatus,
    /// Residue still booked to the rounding account; never above 0.01.
    pub balance_tolerance: Decimal,
    pub failure_policy: FailurePolicy,
    /// Attempts (including the first) before a queued posting is dead-lettered.
    pub max_attempts: u32,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            initial_status: EntryStatus::Draft,
            balance_tolerance: BALANCE_TOLERANCE,
            failure_policy: FailurePolicy::Reject,
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencesConfig {
    /// Postgres `lock_timeout` for the sequence row lock.
    pub lock_timeout_ms: u64,
    /// Per voucher type prefix/padding, overriding the built-in table.
    pub prefixes: HashMap<String, SequenceSettings>,
}

impl Default for SequencesConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2_000,
            prefixes: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Unset means in-memory stores.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

impl LedgerConfig {
    /// Layer defaults, `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config: LedgerConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults (no environment).
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.posting.balance_tolerance;
        if tolerance < Decimal::ZERO || tolerance > BALANCE_TOLERANCE {
            return Err(ConfigError::Message(format!(
                "posting.balance_tolerance must be between 0 and {BALANCE_TOLERANCE}, got {tolerance}"
            )));
        }
        if self.posting.max_attempts == 0 {
            return Err(ConfigError::Message(
                "posting.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Install the global tracing subscriber described by the `log` section.
    pub fn init_logging(&self) {
        booksmith_observability::init(&self.log);
    }

    pub fn balance_policy(&self) -> BalancePolicy {
        BalancePolicy {
            tolerance: self.posting.balance_tolerance,
            rounding_account_code: self.chart.rounding_account().map(str::to_string),
        }
    }

    pub fn sequence_defaults(&self) -> SequenceDefaults {
        self.sequences
            .prefixes
            .iter()
            .fold(SequenceDefaults::default(), |defaults, (kind, settings)| {
                defaults.with_override(kind, settings.clone())
            })
    }
}

//! This module controls configuration parsing from the end user, providing a
//! convenience mechanism for the rest of the program.
//!
//! Configuration arrives in layers. An optional YAML document supplies a
//! [`PartialConfig`], command-line flags supply another, and the flags win
//! wherever both set a value. The merged layers become the immutable
//! [`RunConfig`] that every other component reads.

use std::{env, fs, io, num::NonZeroU32, path::Path, time::Duration};

use byte_unit::Byte;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Environment variable holding a whole YAML configuration. Takes precedence
/// over a configuration file.
pub const CONFIG_ENV_VAR: &str = "LOGFLOOD_CONFIG";

/// Record size used when none is configured, 1KiB.
pub const DEFAULT_RECORD_SIZE: u64 = 1024;

/// Run duration used when none is configured.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
/// Errors produced by configuration loading.
pub enum Error {
    /// IO error
    #[error("Could not read configuration: {0}")]
    Io(#[from] io::Error),
    /// The YAML document is not a valid configuration.
    #[error("Failed to deserialize configuration: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// No layer set the record rate.
    #[error("records_per_second must be configured")]
    MissingRate,
    /// The record size does not fit in memory on this platform.
    #[error("Record size {0} is too large")]
    RecordSize(Byte),
}

/// One layer of configuration. Every field is optional, unset fields fall
/// through to the layer below or to the defaults.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// Arbitrary string to identify the run, output as the `run_id` field
    pub run_id: Option<String>,
    /// Size of each log record, excluding the newline delimiter
    pub record_size: Option<Byte>,
    /// Number of log records per second to emit
    pub records_per_second: Option<NonZeroU32>,
    /// How long to emit records for, a human-readable span such as "10s",
    /// "1500ms" or "1m30s"
    #[serde(default, with = "humantime_serde")]
    pub duration: Option<Duration>,
    /// Emit records until interrupted, ignoring `duration`
    #[serde(default)]
    pub duration_infinite: bool,
    /// Log every emitted record at debug level
    #[serde(default)]
    pub debug: bool,
}

impl PartialConfig {
    /// Layer `over` on top of `self`. Values set in `over` win, flags are
    /// or'ed together.
    #[must_use]
    pub fn merge(self, over: PartialConfig) -> PartialConfig {
        PartialConfig {
            run_id: over.run_id.or(self.run_id),
            record_size: over.record_size.or(self.record_size),
            records_per_second: over.records_per_second.or(self.records_per_second),
            duration: over.duration.or(self.duration),
            duration_infinite: over.duration_infinite || self.duration_infinite,
            debug: over.debug || self.debug,
        }
    }
}

/// Configuration of a single run. Built once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Identifies the run in every record, omitted from records when `None`
    pub run_id: Option<String>,
    /// Exact size in bytes of every record, excluding the delimiter
    pub record_size: usize,
    /// Target number of records per second
    pub records_per_second: NonZeroU32,
    /// How long to emit records for, `None` for no deadline
    pub duration: Option<Duration>,
    /// Log every emitted record at debug level
    pub debug: bool,
}

impl TryFrom<PartialConfig> for RunConfig {
    type Error = Error;

    fn try_from(partial: PartialConfig) -> Result<Self, Self::Error> {
        let records_per_second = partial.records_per_second.ok_or(Error::MissingRate)?;
        let record_size = partial
            .record_size
            .unwrap_or(Byte::from_u64(DEFAULT_RECORD_SIZE));
        let duration = if partial.duration_infinite {
            None
        } else {
            Some(partial.duration.unwrap_or(DEFAULT_DURATION))
        };

        Ok(RunConfig {
            run_id: partial.run_id,
            record_size: usize::try_from(record_size.as_u64())
                .map_err(|_| Error::RecordSize(record_size))?,
            records_per_second,
            duration,
            debug: partial.debug,
        })
    }
}

/// Read the YAML configuration layer, from [`CONFIG_ENV_VAR`] if set, else
/// from `config_path` if given. With neither the layer is empty.
///
/// # Errors
///
/// Function will error if the file cannot be read or the YAML is not a valid
/// configuration.
pub fn load(config_path: Option<&Path>) -> Result<PartialConfig, Error> {
    let contents = if let Ok(env_var_value) = env::var(CONFIG_ENV_VAR) {
        debug!("Using config from env var '{CONFIG_ENV_VAR}'");
        env_var_value
    } else if let Some(path) = config_path {
        debug!("Attempting to open configuration file at: {}", path.display());
        fs::read_to_string(path).map_err(|err| {
            error!("Could not read config file '{}': {}", path.display(), err);
            err
        })?
    } else {
        return Ok(PartialConfig::default());
    };

    parse(&contents)
}

/// Parse a YAML configuration layer.
///
/// # Errors
///
/// Function will error if the YAML is not a valid configuration.
pub fn parse(contents: &str) -> Result<PartialConfig, Error> {
    serde_yaml::from_str(contents).map_err(|err| {
        error!("Configuration validation failed: {}", err);
        Error::SerdeYaml(err)
    })
}

//! Runtime configuration and its command-line surface.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;
pub const DEFAULT_FETCH_NAP: Duration = Duration::from_secs(60);
pub const DEFAULT_PORTION_NAP: Duration = Duration::from_secs(10);
pub const DEFAULT_OUTPUT_DIR: &str = "/tmp";

/// What the tailer needs to know about its job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailConfig {
    /// Instance whose logs are tailed.
    pub instance_id: String,
    /// Maximum number of records requested per fetch.
    pub chunk_size: usize,
    /// Sleep between poll cycles.
    pub fetch_nap: Duration,
    /// Sleep between fetches while draining a rotated file.
    pub portion_nap: Duration,
    /// Directory receiving one output file per tail session.
    pub output_dir: PathBuf,
    /// Loop forever instead of running a single poll cycle.
    pub run_as_service: bool,
}

impl TailConfig {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.instance_id.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "instance id must not be empty".to_string(),
            });
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig {
                message: "chunk size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            instance_id: String::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            fetch_nap: DEFAULT_FETCH_NAP,
            portion_nap: DEFAULT_PORTION_NAP,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            run_as_service: false,
        }
    }
}

/// Everything the binary needs: the tail job plus process plumbing.
#[derive(Debug, Clone)]
pub struct Settings {
    pub tail: TailConfig,
    /// Root directory served by the directory log source.
    pub source_dir: PathBuf,
    pub log_level: String,
}

#[derive(Parser, Debug)]
#[command(
    name = "portion-tail",
    version,
    about = "Tails a rotating remote log into local files"
)]
struct Args {
    /// Instance whose log files are tailed
    #[arg(long = "instance-id", value_name = "ID")]
    instance_id: String,

    /// Directory holding one subdirectory of log files per instance
    #[arg(long = "source-dir", value_name = "DIR", default_value = ".")]
    source_dir: PathBuf,

    /// Maximum number of lines fetched per portion
    #[arg(long = "chunk-size", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Nap between poll cycles (e.g. 500ms, 10s, 1m)
    #[arg(long = "fetch-nap", value_parser = parse_duration, default_value = "1m")]
    fetch_nap: Duration,

    /// Nap between portion fetches while draining a rotated file
    #[arg(long = "portion-nap", value_parser = parse_duration, default_value = "10s")]
    portion_nap: Duration,

    /// Directory where downloaded files are written
    #[arg(long = "retrieved-file-dir", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    retrieved_file_dir: PathBuf,

    /// Keep polling forever instead of running a single cycle
    #[arg(long = "run-as-service")]
    run_as_service: bool,

    /// Log level of this tool (trace, debug, info, warn, error)
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_settings(self) -> Result<Settings> {
        let tail = TailConfig {
            instance_id: self.instance_id,
            chunk_size: self.chunk_size,
            fetch_nap: self.fetch_nap,
            portion_nap: self.portion_nap,
            output_dir: self.retrieved_file_dir,
            run_as_service: self.run_as_service,
        };
        tail.validate()?;

        Ok(Settings {
            tail,
            source_dir: self.source_dir,
            log_level: self.log_level,
        })
    }
}

/// Parses the process arguments. Usage errors exit the process via clap.
pub fn parse() -> Result<Settings> {
    Args::parse().into_settings()
}

/// Parses an explicit argument list without exiting on usage errors.
pub fn try_parse_from<I, T>(args: I) -> Result<Settings>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(args)
        .map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })?
        .into_settings()
}

/// Parses `500ms`, `10s`, `1m` or `2h`. A bare number means seconds.
pub fn parse_duration(value: &str) -> std::result::Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);

    let amount: u64 = amount
        .parse()
        .map_err(|_| format!("invalid duration '{}'", value))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(amount.saturating_mul(3600))),
        other => Err(format!("unknown duration unit '{}' in '{}'", other, value)),
    }
}

//! Tails a rotating log file that is only reachable through a paginated
//! "list files / download portion" API, and reassembles it into local,
//! append-only files without gaps or duplicated bytes across rotations.
//!
//! Each poll cycle discovers the current log file, drains the previous file
//! completely if the provider rotated, then fetches one portion of the current
//! file and appends it to a [`Sink`].
//!
//! # Example
//!
//! ```rust,no_run
//! use portion_tail::{DirectorySource, FileSink, TailConfig, tail};
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TailConfig {
//!         run_as_service: true,
//!         ..TailConfig::new("db-1")
//!     };
//!     let source = DirectorySource::new("/srv/logs");
//!     let sink = FileSink::new(&config.output_dir);
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     tail(source, sink, config, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod directory;
mod error;
mod fetch;
pub mod logging;
mod model;
mod poll;
mod rotation;
mod sink;
mod source;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use config::{Settings, TailConfig};
pub use directory::DirectorySource;
pub use error::{Error, ErrorKind, ProviderError, Result};
pub use fetch::FetchLoop;
pub use model::{Cursor, LogFileId, Portion, TailState};
pub use poll::Tailer;
pub use rotation::{Transition, track};
pub use sink::{FileSink, Sink, session_path};
pub use source::LogSource;

use tokio::sync::broadcast;

/// Tails `config.instance_id` from a fresh state until shutdown, or for a
/// single poll cycle when `config.run_as_service` is off.
///
/// Returns the final state. Any provider or sink error ends tailing.
pub async fn tail<S, K>(
    source: S,
    sink: K,
    config: TailConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<TailState>
where
    S: LogSource,
    K: Sink,
{
    Tailer::new(source, sink, config)?
        .run(TailState::default(), shutdown)
        .await
}

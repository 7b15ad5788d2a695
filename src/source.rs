//! The remote side: a service that lists log files and serves them in portions.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, ProviderError, Result};
use crate::model::{Cursor, LogFileId, Portion};

/// A provider of rotating log files, paginated by an opaque cursor.
///
/// Implementors talk to whatever hosts the logs. The tailer only ever calls
/// these two operations and treats every error as fatal.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Lists the known log files of `instance`, most recent last.
    async fn list_current(
        &self,
        instance: &str,
    ) -> std::result::Result<Vec<LogFileId>, ProviderError>;

    /// Fetches at most `max_records` records of `file` starting at `cursor`.
    async fn fetch_portion(
        &self,
        instance: &str,
        file: &LogFileId,
        cursor: &Cursor,
        max_records: usize,
    ) -> std::result::Result<Portion, ProviderError>;

    /// Returns the log file currently written to, i.e. the last one listed.
    async fn discover(&self, instance: &str) -> Result<LogFileId> {
        let files = self
            .list_current(instance)
            .await
            .map_err(|source| Error::Discovery {
                instance: instance.to_string(),
                source,
            })?;
        debug!(instance, count = files.len(), "listed log files");

        files.into_iter().last().ok_or_else(|| Error::NoLogFiles {
            instance: instance.to_string(),
        })
    }
}

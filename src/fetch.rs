//! Pulling a log file forward portion by portion.

use std::time::Duration;
use tracing::{debug, info, trace};

use crate::config::TailConfig;
use crate::error::{Error, Result};
use crate::model::{Cursor, LogFileId, Portion};
use crate::sink::Sink;
use crate::source::LogSource;

/// Fetches portions of one instance's log files and appends them to a sink.
pub struct FetchLoop<'a, S: ?Sized, K: ?Sized> {
    source: &'a S,
    sink: &'a mut K,
    instance: &'a str,
    chunk_size: usize,
    portion_nap: Duration,
}

impl<'a, S, K> FetchLoop<'a, S, K>
where
    S: LogSource + ?Sized,
    K: Sink + ?Sized,
{
    pub fn new(source: &'a S, sink: &'a mut K, config: &'a TailConfig) -> Self {
        Self {
            source,
            sink,
            instance: &config.instance_id,
            chunk_size: config.chunk_size,
            portion_nap: config.portion_nap,
        }
    }

    /// Issues exactly one fetch for `file` at `cursor` and appends the result.
    ///
    /// The returned portion's bytes are durable in the sink by the time this
    /// returns. A failed fetch appends nothing.
    pub async fn advance_once(&mut self, file: &LogFileId, cursor: &Cursor) -> Result<Portion> {
        debug!(file = %file, cursor = %cursor, "requesting portion");
        let portion = self
            .source
            .fetch_portion(self.instance, file, cursor, self.chunk_size)
            .await
            .map_err(|source| Error::Fetch {
                instance: self.instance.to_string(),
                file: file.clone(),
                cursor: cursor.clone(),
                source,
            })?;
        debug!(
            file = %file,
            next_cursor = %portion.next_cursor,
            bytes = portion.data.len(),
            more_pending = portion.more_pending,
            "received portion"
        );
        trace!(data = %String::from_utf8_lossy(&portion.data));

        self.sink.open(file).await?;
        if !portion.data.is_empty() {
            self.sink.append(file, &portion.data).await?;
        }
        Ok(portion)
    }

    /// Fetches `file` from `cursor` until the source has nothing pending.
    ///
    /// Sleeps the portion nap between fetches. Returns the final cursor.
    pub async fn drain(&mut self, file: &LogFileId, cursor: Cursor) -> Result<Cursor> {
        let mut cursor = cursor;
        let mut portions = 0usize;
        loop {
            let portion = self.advance_once(file, &cursor).await?;
            portions += 1;
            cursor = portion.next_cursor;
            if !portion.more_pending {
                info!(file = %file, cursor = %cursor, portions, "drained log file");
                return Ok(cursor);
            }
            tokio::time::sleep(self.portion_nap).await;
        }
    }
}

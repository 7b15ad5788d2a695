//! The top-level driver: discover, handle rotation, fetch, nap, repeat.

use tokio::sync::broadcast;
use tracing::info;

use crate::config::TailConfig;
use crate::error::Result;
use crate::fetch::FetchLoop;
use crate::model::{Cursor, TailState};
use crate::rotation::{Transition, track};
use crate::sink::Sink;
use crate::source::LogSource;

/// Tails the current log file of one instance across rotations.
pub struct Tailer<S, K> {
    source: S,
    sink: K,
    config: TailConfig,
}

impl<S, K> Tailer<S, K>
where
    S: LogSource,
    K: Sink,
{
    pub fn new(source: S, sink: K, config: TailConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            sink,
            config,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Runs one poll cycle and returns the state for the next one.
    ///
    /// On rotation the previous file is drained to completion before the new
    /// file is fetched, so no byte of the new file reaches the sink while the
    /// old one still has pending content.
    pub async fn poll_once(&mut self, state: TailState) -> Result<TailState> {
        let instance = self.config.instance_id.as_str();
        let discovered = self.source.discover(instance).await?;

        let (active, cursor) = match track(&state, &discovered) {
            Transition::Continue => (discovered, state.active_cursor),
            Transition::Adopt(file) => {
                info!(instance, file = %file, "tailing log file from the beginning");
                (file, Cursor::beginning())
            }
            Transition::Rotate {
                previous,
                previous_cursor,
                next,
            } => {
                info!(
                    instance,
                    previous = %previous,
                    cursor = %previous_cursor,
                    next = %next,
                    "log file rotated, draining previous file"
                );
                FetchLoop::new(&self.source, &mut self.sink, &self.config)
                    .drain(&previous, previous_cursor)
                    .await?;
                self.sink.close(&previous).await?;
                (next, Cursor::beginning())
            }
        };

        let portion = FetchLoop::new(&self.source, &mut self.sink, &self.config)
            .advance_once(&active, &cursor)
            .await?;

        Ok(TailState {
            active_file: Some(active),
            active_cursor: portion.next_cursor,
        })
    }

    /// Polls until shutdown, or exactly once when not running as a service.
    ///
    /// Shutdown is only observed while napping between cycles, so a drain in
    /// progress always completes.
    pub async fn run(
        &mut self,
        mut state: TailState,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<TailState> {
        loop {
            state = self.poll_once(state).await?;
            if !self.config.run_as_service {
                return Ok(state);
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    info!(instance = %self.config.instance_id, "shutdown requested, stopping");
                    return Ok(state);
                }
                _ = tokio::time::sleep(self.config.fetch_nap) => {}
            }
        }
    }
}

//! Test doubles: a scripted log source and a sink that records every call.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::error::{Error, ProviderError, Result};
use crate::model::{Cursor, LogFileId, Portion};
use crate::sink::Sink;
use crate::source::LogSource;

/// A [`LogSource`] answering from pre-recorded discovery lists and portions.
///
/// Each `list_current` call pops the next scripted listing; the last one
/// repeats once the script runs out. Unscripted `(file, cursor)` pairs return
/// an empty portion with no pending data.
#[derive(Default)]
pub struct ScriptedSource {
    listings: Mutex<VecDeque<Vec<LogFileId>>>,
    last_listing: Mutex<Vec<LogFileId>>,
    discovery_error: Mutex<Option<ProviderError>>,
    portions: Mutex<HashMap<(LogFileId, Cursor), std::result::Result<Portion, ProviderError>>>,
    list_calls: Mutex<usize>,
    fetch_calls: Mutex<Vec<(LogFileId, Cursor, usize)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one discovery listing.
    pub fn discovers(self, files: &[&str]) -> Self {
        let listing = files.iter().map(|f| LogFileId::from(*f)).collect();
        self.listings.lock().unwrap().push_back(listing);
        self
    }

    pub fn fails_discovery(self, error: ProviderError) -> Self {
        *self.discovery_error.lock().unwrap() = Some(error);
        self
    }

    /// Scripts the portion served for `file` at `cursor`.
    pub fn serves(self, file: &str, cursor: &str, data: &str, next: &str, more: bool) -> Self {
        self.portions.lock().unwrap().insert(
            (LogFileId::from(file), Cursor::from(cursor)),
            Ok(Portion::new(data, next, more)),
        );
        self
    }

    pub fn fails_fetch(self, file: &str, cursor: &str, error: ProviderError) -> Self {
        self.portions
            .lock()
            .unwrap()
            .insert((LogFileId::from(file), Cursor::from(cursor)), Err(error));
        self
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn fetch_calls(&self) -> Vec<(LogFileId, Cursor, usize)> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn list_current(
        &self,
        _instance: &str,
    ) -> std::result::Result<Vec<LogFileId>, ProviderError> {
        *self.list_calls.lock().unwrap() += 1;
        if let Some(error) = self.discovery_error.lock().unwrap().take() {
            return Err(error);
        }

        let mut last = self.last_listing.lock().unwrap();
        if let Some(listing) = self.listings.lock().unwrap().pop_front() {
            *last = listing;
        }
        Ok(last.clone())
    }

    async fn fetch_portion(
        &self,
        _instance: &str,
        file: &LogFileId,
        cursor: &Cursor,
        max_records: usize,
    ) -> std::result::Result<Portion, ProviderError> {
        self.fetch_calls
            .lock()
            .unwrap()
            .push((file.clone(), cursor.clone(), max_records));

        match self
            .portions
            .lock()
            .unwrap()
            .remove(&(file.clone(), cursor.clone()))
        {
            Some(scripted) => scripted,
            None => Ok(Portion::new(Vec::<u8>::new(), cursor.clone(), false)),
        }
    }
}

/// Everything a [`RecordingSink`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Open(LogFileId),
    Append(LogFileId, Vec<u8>),
    Close(LogFileId),
}

/// An in-memory [`Sink`] that keeps a journal of calls.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    /// Appends to this file fail once this many of them have succeeded.
    failing_append: Option<(LogFileId, usize)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes appends to `file` fail with a sink error after `successes`
    /// appends to it went through. Failed appends are not journaled.
    pub fn fails_append_after(mut self, file: &str, successes: usize) -> Self {
        self.failing_append = Some((LogFileId::from(file), successes));
        self
    }

    /// Concatenation of everything appended for `file`.
    pub fn contents(&self, file: &str) -> Vec<u8> {
        let file = LogFileId::from(file);
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Append(id, data) if *id == file => Some(data.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Index of the first append carrying bytes for `file`.
    pub fn first_append(&self, file: &str) -> Option<usize> {
        let file = LogFileId::from(file);
        self.events.iter().position(
            |event| matches!(event, SinkEvent::Append(id, data) if *id == file && !data.is_empty()),
        )
    }

    /// Index of the last append carrying bytes for `file`.
    pub fn last_append(&self, file: &str) -> Option<usize> {
        let file = LogFileId::from(file);
        self.events.iter().rposition(
            |event| matches!(event, SinkEvent::Append(id, data) if *id == file && !data.is_empty()),
        )
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn open(&mut self, file: &LogFileId) -> Result<()> {
        self.events.push(SinkEvent::Open(file.clone()));
        Ok(())
    }

    async fn append(&mut self, file: &LogFileId, data: &[u8]) -> Result<()> {
        if let Some((failing, successes)) = &self.failing_append {
            let done = self
                .events
                .iter()
                .filter(|event| matches!(event, SinkEvent::Append(id, _) if id == failing))
                .count();
            if failing == file && done >= *successes {
                return Err(Error::sink(
                    file.as_str(),
                    std::io::Error::other("no space left on device"),
                ));
            }
        }
        self.events.push(SinkEvent::Append(file.clone(), data.to_vec()));
        Ok(())
    }

    async fn close(&mut self, file: &LogFileId) -> Result<()> {
        self.events.push(SinkEvent::Close(file.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_repeats_last_listing() {
        let source = ScriptedSource::new().discovers(&["a"]).discovers(&["a", "b"]);

        assert_eq!(source.list_current("i").await.unwrap(), vec![LogFileId::from("a")]);
        assert_eq!(source.list_current("i").await.unwrap().len(), 2);
        assert_eq!(source.list_current("i").await.unwrap().len(), 2);
        assert_eq!(source.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_source_unscripted_portion_is_empty() {
        let source = ScriptedSource::new();
        let cursor = Cursor::from("7");

        let portion = source
            .fetch_portion("i", &LogFileId::from("a"), &cursor, 10)
            .await
            .unwrap();
        assert!(portion.data.is_empty());
        assert_eq!(portion.next_cursor, cursor);
        assert!(!portion.more_pending);
    }

    #[tokio::test]
    async fn test_recording_sink_contents() {
        let mut sink = RecordingSink::new();
        let a = LogFileId::from("a");
        sink.append(&a, b"ab").await.unwrap();
        sink.append(&LogFileId::from("b"), b"zz").await.unwrap();
        sink.append(&a, b"c").await.unwrap();

        assert_eq!(sink.contents("a"), b"abc");
        assert_eq!(sink.first_append("b"), Some(1));
        assert_eq!(sink.last_append("a"), Some(2));
    }

    #[tokio::test]
    async fn test_recording_sink_failing_append() {
        let mut sink = RecordingSink::new().fails_append_after("a", 1);
        let a = LogFileId::from("a");

        sink.append(&a, b"ok").await.unwrap();
        sink.append(&LogFileId::from("b"), b"zz").await.unwrap();
        let error = sink.append(&a, b"lost").await.unwrap_err();

        assert_eq!(error.kind(), crate::error::ErrorKind::Sink);
        assert_eq!(sink.contents("a"), b"ok");
        assert_eq!(sink.events.len(), 2);
    }
}

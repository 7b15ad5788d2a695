//! Identities, cursors and portions exchanged with a log source.

use std::fmt;

/// Provider assigned name of one rotation of the tailed log.
///
/// Only equality is meaningful; there is no ordering between identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogFileId(String);

impl LogFileId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogFileId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LogFileId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Opaque pagination marker handed out by the provider.
///
/// Cursors are only valid for the file that produced them and are never
/// compared for order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    /// Marker for the start of a freshly discovered file.
    pub const BEGINNING: &'static str = "0";

    pub fn beginning() -> Self {
        Self(Self::BEGINNING.to_string())
    }

    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_beginning(&self) -> bool {
        self.0 == Self::BEGINNING
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::beginning()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(marker: &str) -> Self {
        Self::new(marker)
    }
}

impl From<String> for Cursor {
    fn from(marker: String) -> Self {
        Self(marker)
    }
}

/// One bounded chunk of log content.
///
/// `more_pending` only says more bytes exist at `next_cursor` for the same
/// file. It says nothing about rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portion {
    pub data: Vec<u8>,
    pub next_cursor: Cursor,
    pub more_pending: bool,
}

impl Portion {
    pub fn new(data: impl Into<Vec<u8>>, next_cursor: impl Into<Cursor>, more_pending: bool) -> Self {
        Self {
            data: data.into(),
            next_cursor: next_cursor.into(),
            more_pending,
        }
    }
}

/// The only state carried from one poll cycle to the next.
///
/// Starts with no active file. Never persisted, so every process start
/// re-tails the then current file from its beginning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailState {
    pub active_file: Option<LogFileId>,
    pub active_cursor: Cursor,
}

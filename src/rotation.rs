//! Detecting that the provider moved on to a new log file.

use crate::model::{Cursor, LogFileId, TailState};

/// What a discovery result means for the file being tailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing was tailed yet: start on the discovered file, no drain.
    Adopt(LogFileId),
    /// Still the same file: keep fetching at the current cursor.
    Continue,
    /// A different file showed up. `previous` must be drained from
    /// `previous_cursor` before `next` is fetched from the beginning.
    Rotate {
        previous: LogFileId,
        previous_cursor: Cursor,
        next: LogFileId,
    },
}

/// Compares the active file of `state` with a freshly `discovered` one.
pub fn track(state: &TailState, discovered: &LogFileId) -> Transition {
    match &state.active_file {
        None => Transition::Adopt(discovered.clone()),
        Some(active) if active == discovered => Transition::Continue,
        Some(active) => Transition::Rotate {
            previous: active.clone(),
            previous_cursor: state.active_cursor.clone(),
            next: discovered.clone(),
        },
    }
}

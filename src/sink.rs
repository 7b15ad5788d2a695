//! Local, append-only output files, one per tail session.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::LogFileId;

/// Timestamp suffix appended to every session file name.
const SESSION_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.3f";

/// Where fetched bytes end up.
///
/// `open` must be idempotent within a tail session and `append` must not
/// return before the bytes are durable.
#[async_trait]
pub trait Sink: Send {
    /// Starts (or continues) the tail session for `file`.
    async fn open(&mut self, file: &LogFileId) -> Result<()>;

    /// Appends `data` to the session of `file` and flushes it to stable storage.
    async fn append(&mut self, file: &LogFileId, data: &[u8]) -> Result<()>;

    /// Ends the tail session for `file`.
    async fn close(&mut self, file: &LogFileId) -> Result<()>;
}

/// Builds `<dir>/<file>_<timestamp>` for a fresh tail session.
///
/// Identities containing `/` map to nested paths below `dir`. A leading `/` is
/// ignored; `..` or an identity without a file name is rejected, so the result
/// always stays inside `dir`.
pub fn session_path(dir: &Path, file: &LogFileId, at: DateTime<Local>) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(file.as_str()).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(outside_dir(dir, file));
            }
        }
    }

    let Some(name) = relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
    else {
        return Err(outside_dir(dir, file));
    };
    relative.set_file_name(format!("{}_{}", name, at.format(SESSION_TIMESTAMP_FORMAT)));
    Ok(dir.join(relative))
}

fn outside_dir(dir: &Path, file: &LogFileId) -> Error {
    Error::sink(
        dir,
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file name '{}' leaves the output directory", file),
        ),
    )
}

struct Session {
    path: PathBuf,
    file: File,
}

/// A [`Sink`] writing each session to its own file inside a directory.
pub struct FileSink {
    dir: PathBuf,
    sessions: HashMap<LogFileId, Session>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sessions: HashMap::new(),
        }
    }

    /// Output path of the open session for `file`, if any.
    pub fn path_of(&self, file: &LogFileId) -> Option<&Path> {
        self.sessions.get(file).map(|session| session.path.as_path())
    }

    /// The open session for `file`, starting one if needed.
    async fn session(&mut self, file: &LogFileId) -> Result<&mut Session> {
        match self.sessions.entry(file.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let session = start_session(&self.dir, file).await?;
                Ok(entry.insert(session))
            }
        }
    }
}

async fn start_session(dir: &Path, file: &LogFileId) -> Result<Session> {
    let path = session_path(dir, file, Local::now())?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::sink(parent, e))?;
    }

    let handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|e| Error::sink(&path, e))?;

    info!(file = %file, path = %path.display(), "opened output file");
    Ok(Session { path, file: handle })
}

#[async_trait]
impl Sink for FileSink {
    async fn open(&mut self, file: &LogFileId) -> Result<()> {
        self.session(file).await.map(|_| ())
    }

    async fn append(&mut self, file: &LogFileId, data: &[u8]) -> Result<()> {
        let session = self.session(file).await?;

        session
            .file
            .write_all(data)
            .await
            .map_err(|e| Error::sink(&session.path, e))?;
        session
            .file
            .flush()
            .await
            .map_err(|e| Error::sink(&session.path, e))?;
        session
            .file
            .sync_data()
            .await
            .map_err(|e| Error::sink(&session.path, e))?;

        debug!(file = %file, bytes = data.len(), "appended portion");
        Ok(())
    }

    async fn close(&mut self, file: &LogFileId) -> Result<()> {
        if let Some(session) = self.sessions.remove(file) {
            info!(file = %file, path = %session.path.display(), "closed output file");
        }
        Ok(())
    }
}

//! A [`LogSource`] serving rotating log files from a local directory tree.
//!
//! Layout is `<root>/<instance>/<log file>`. Whatever writes the logs rotates
//! them by starting a new file; the most recently modified file is current.
//! Cursors are decimal byte offsets, which is an implementation detail of this
//! source: the tailer never looks inside them.

use async_trait::async_trait;
use std::io::{self, SeekFrom};
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;
use tracing::warn;

use crate::error::ProviderError;
use crate::model::{Cursor, LogFileId, Portion};
use crate::source::LogSource;

const INSTANCE_NOT_FOUND: &str = "DBInstanceNotFound";
const LOG_FILE_NOT_FOUND: &str = "DBLogFileNotFoundFault";
const INVALID_PARAMETER: &str = "InvalidParameterValue";
const ACCESS_DENIED: &str = "AccessDenied";
const INTERNAL_FAILURE: &str = "InternalFailure";

/// Serves `<root>/<instance>` directories as instances with rotating logs.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn instance_dir(&self, instance: &str) -> Result<PathBuf, ProviderError> {
        let mut components = Path::new(instance).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(instance)),
            _ => Err(ProviderError::new(format!("invalid instance identifier '{}'", instance))
                .with_code(INVALID_PARAMETER)),
        }
    }

    fn log_path(&self, instance: &str, file: &LogFileId) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(file.as_str());
        let is_contained = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_contained {
            return Err(
                ProviderError::new(format!("invalid log file name '{}'", file))
                    .with_code(INVALID_PARAMETER),
            );
        }
        Ok(self.instance_dir(instance)?.join(relative))
    }
}

#[async_trait]
impl LogSource for DirectorySource {
    async fn list_current(&self, instance: &str) -> Result<Vec<LogFileId>, ProviderError> {
        let dir = self.instance_dir(instance)?;
        let entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_failure(&dir, INSTANCE_NOT_FOUND, e))?;

        let mut stream = ReadDirStream::new(entries);
        let mut files = Vec::new();
        while let Some(entry) = stream.next().await {
            let entry = entry.map_err(|e| io_failure(&dir, INSTANCE_NOT_FOUND, e))?;
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| io_failure(&entry.path(), LOG_FILE_NOT_FOUND, e))?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map_err(|e| io_failure(&entry.path(), INTERNAL_FAILURE, e))?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, "skipping log file with a non UTF-8 name");
                    continue;
                }
            };
            files.push((modified, name));
        }

        // Oldest first, so the file currently written to comes last.
        files.sort();
        Ok(files
            .into_iter()
            .map(|(_, name)| LogFileId::from(name))
            .collect())
    }

    async fn fetch_portion(
        &self,
        instance: &str,
        file: &LogFileId,
        cursor: &Cursor,
        max_records: usize,
    ) -> Result<Portion, ProviderError> {
        let path = self.log_path(instance, file)?;
        let offset = parse_marker(cursor)?;

        let mut handle = File::open(&path)
            .await
            .map_err(|e| io_failure(&path, LOG_FILE_NOT_FOUND, e))?;
        let current_size = handle
            .metadata()
            .await
            .map_err(|e| io_failure(&path, LOG_FILE_NOT_FOUND, e))?
            .len();

        if detect_file_truncation(current_size, offset) {
            return Err(ProviderError::new(format!(
                "marker {} is beyond the end of {} ({} bytes)",
                cursor, file, current_size
            ))
            .with_code(INVALID_PARAMETER));
        }

        let Some(bytes_to_read) = calculate_bytes_to_read(current_size, offset) else {
            return Ok(Portion::new(Vec::<u8>::new(), cursor.clone(), false));
        };

        handle
            .seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| io_failure(&path, INTERNAL_FAILURE, e))?;
        let mut reader = BufReader::new(handle.take(bytes_to_read));
        let data = read_records(&mut reader, max_records)
            .await
            .map_err(|e| io_failure(&path, INTERNAL_FAILURE, e))?;

        let next = offset + data.len() as u64;
        Ok(Portion::new(data, next.to_string(), next < current_size))
    }
}

/// Reads up to `max_records` newline terminated records.
async fn read_records<R>(reader: &mut R, max_records: usize) -> io::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut data = Vec::new();
    for _ in 0..max_records {
        if reader.read_until(b'\n', &mut data).await? == 0 {
            break;
        }
    }
    Ok(data)
}

fn parse_marker(cursor: &Cursor) -> Result<u64, ProviderError> {
    cursor.as_str().parse().map_err(|_| {
        ProviderError::new(format!("invalid marker '{}'", cursor)).with_code(INVALID_PARAMETER)
    })
}

fn io_failure(path: &Path, not_found_code: &str, error: io::Error) -> ProviderError {
    let code = match error.kind() {
        io::ErrorKind::NotFound => not_found_code,
        io::ErrorKind::PermissionDenied => ACCESS_DENIED,
        _ => INTERNAL_FAILURE,
    };
    ProviderError::new(format!("{}: {}", path.display(), error))
        .with_code(code)
        .with_cause(error)
}

/// Detect if the file was truncated by comparing current size with the marker
fn detect_file_truncation(current_size: u64, offset: u64) -> bool {
    current_size < offset
}

/// Calculate bytes to read based on current size and marker offset
fn calculate_bytes_to_read(current_size: u64, offset: u64) -> Option<u64> {
    if current_size <= offset {
        None
    } else {
        Some(current_size - offset)
    }
}

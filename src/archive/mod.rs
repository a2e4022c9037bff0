//! Dated archive files and atomic writes.
//!
//! Every file lands in its destination through a temporary file created in the
//! same directory followed by a rename, so readers never see a partial file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use futures::{Stream, StreamExt};
use tempfile::{Builder, NamedTempFile};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::{MirrorError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const CSV_SUFFIX: &str = ".csv";

/// File name a URL is archived under on `date`:
/// `<last path segment without .csv>-<YYYY-MM-DD>.csv`.
pub fn archive_file_name(url: &str, date: NaiveDate) -> Result<String> {
    let parsed = Url::parse(url)?;
    let base = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| MirrorError::MissingFileName(url.to_string()))?;

    let stem = base.strip_suffix(CSV_SUFFIX).unwrap_or(base);
    if stem.is_empty() {
        return Err(MirrorError::MissingFileName(url.to_string()));
    }

    Ok(format!("{}-{}{}", stem, date.format(DATE_FORMAT), CSV_SUFFIX))
}

pub fn archive_path(directory: &Path, url: &str, date: NaiveDate) -> Result<PathBuf> {
    Ok(directory.join(archive_file_name(url, date)?))
}

fn temp_file_in(directory: &Path) -> io::Result<NamedTempFile> {
    Builder::new().prefix(".").suffix(".tmp").tempfile_in(directory)
}

/// Stream `body` into `final_path`, which must live in `directory`.
///
/// The destination is only touched by the final rename. If the stream or any
/// write fails, the temporary file is removed and the error returned. When
/// `mtime_hint` holds a parseable HTTP date, the file's modification time is
/// set from it; failing to do so is only logged.
///
/// Returns the number of bytes written.
pub async fn write_atomically<S>(
    directory: &Path,
    final_path: &Path,
    mut body: S,
    mtime_hint: Option<&str>,
) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let (file, temp_path) = temp_file_in(directory)?.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    temp_path.persist(final_path).map_err(io::Error::from)?;

    if let Some(hint) = mtime_hint {
        let result = match parse_http_date(hint) {
            Some(modified) => set_modified(final_path, modified).await,
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "unparseable HTTP date",
            )),
        };
        if let Err(e) = result {
            tracing::warn!(
                path = %final_path.display(),
                last_modified = hint,
                error = %e,
                "Could not set modification time"
            );
        }
    }

    Ok(written)
}

/// Replace `path` with `contents` in one rename.
pub fn write_file_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = temp_file_in(directory)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Parse an HTTP date in any of its three forms: IMF-fixdate
/// (`Sun, 06 Nov 1994 08:49:37 GMT`), RFC 850 (`Sunday, 06-Nov-94 08:49:37 GMT`)
/// or asctime (`Sun Nov  6 08:49:37 1994`).
///
/// The weekday name is skipped and never checked against the date.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    let parsed = match value.split_once(", ") {
        Some((_, rest)) => NaiveDateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S GMT")
            .or_else(|_| NaiveDateTime::parse_from_str(rest, "%d-%b-%y %H:%M:%S GMT")),
        None => {
            let (_, rest) = value.split_once(' ')?;
            NaiveDateTime::parse_from_str(rest.trim_start(), "%b %e %H:%M:%S %Y")
        }
    };

    parsed.ok().map(|dt| dt.and_utc())
}

async fn set_modified(path: &Path, modified: DateTime<Utc>) -> io::Result<()> {
    let file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await?
        .into_std()
        .await;

    tokio::task::spawn_blocking(move || file.set_modified(SystemTime::from(modified)))
        .await
        .map_err(io::Error::other)?
}

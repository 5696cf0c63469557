//! Progress-tracked object download
//!
//! An object is fetched as byte ranges, several at a time, into a temporary
//! file created next to the destination. Only a complete file is renamed
//! into place; on any failure the temporary file is removed.

use std::io::SeekFrom;
use std::ops::Range;
use std::path::PathBuf;

use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::path::ObjectRef;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::traits::ObjectStore;

/// Default size of each ranged request: 8 MiB
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

/// Minimum part size: 64 KiB
pub const MIN_PART_SIZE: u64 = 64 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Default number of ranged requests in flight
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Prefix of temporary download files
pub const TEMP_PREFIX: &str = ".s3commander-";

/// Ranged transfer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Part size in bytes
    pub part_size: u64,

    /// Number of concurrent ranged requests
    pub concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl DownloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }
}

/// Options for a single download
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Destination directory; the current directory when unset
    pub destination: Option<PathBuf>,

    /// Fail instead of replacing an existing file at the destination
    pub no_clobber: bool,

    /// Ranged transfer tuning
    pub config: DownloadConfig,
}

/// Outcome of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Path of the published file
    pub path: PathBuf,

    /// Size reported by the metadata probe
    pub size: u64,

    /// Bytes written to disk
    pub bytes_written: u64,
}

/// Split `[0, size)` into consecutive ranges of at most `part_size` bytes
pub fn part_ranges(size: u64, part_size: u64) -> Vec<Range<u64>> {
    let part_size = part_size.max(1);
    (0..size.div_ceil(part_size))
        .map(|part| {
            let start = part * part_size;
            start..(start + part_size).min(size)
        })
        .collect()
}

/// Resolve the directory a download is published into
pub fn destination_dir(options: &DownloadOptions) -> Result<PathBuf> {
    match &options.destination {
        Some(dir) => Ok(dir.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

/// Download `object` into the destination directory under its file name
///
/// The object size is probed before any local file is created. Progress is
/// reported to `observer` after every chunk; a zero-byte object reports
/// completion immediately.
pub async fn download(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    options: &DownloadOptions,
    observer: &dyn ProgressObserver,
) -> Result<DownloadReport> {
    object.validate()?;
    let file_name = object.file_name()?.to_string();

    let size = store.content_length(object).await?;

    let dest_dir = destination_dir(options)?;
    let target = dest_dir.join(&file_name);
    if options.no_clobber && target.exists() {
        return Err(Error::Conflict(format!(
            "Destination exists: {}",
            target.display()
        )));
    }

    let temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".part")
        .tempfile_in(&dest_dir)?;
    tracing::debug!(
        object = %object,
        size,
        temp = %temp.path().display(),
        "starting download"
    );

    let tracker = ProgressTracker::new(size);
    observer.on_start(size);

    let transferred = if size == 0 {
        observer.on_progress(tracker.snapshot());
        Ok(())
    } else {
        transfer(store, object, &temp, &tracker, observer, &options.config).await
    };

    if let Err(e) = transferred {
        discard(temp);
        return Err(e);
    }

    let bytes_written = tracker.snapshot().downloaded;
    if bytes_written != size {
        discard(temp);
        return Err(Error::Protocol(format!(
            "{object}: wrote {bytes_written} bytes, expected {size}"
        )));
    }

    if let Err(e) = temp.as_file().sync_all() {
        discard(temp);
        return Err(e.into());
    }

    let persisted = if options.no_clobber {
        temp.persist_noclobber(&target)
    } else {
        temp.persist(&target)
    };
    // A failed rename drops the temporary file along with the error.
    persisted.map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists => {
            Error::Conflict(format!("Destination exists: {}", target.display()))
        }
        _ => Error::Io(e.error),
    })?;

    observer.on_finish();
    tracing::debug!(path = %target.display(), bytes_written, "download published");

    Ok(DownloadReport {
        path: target,
        size,
        bytes_written,
    })
}

/// Fetch every part of the object into `temp`
async fn transfer(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    temp: &NamedTempFile,
    tracker: &ProgressTracker,
    observer: &dyn ProgressObserver,
    config: &DownloadConfig,
) -> Result<()> {
    let ranges = part_ranges(tracker.size(), config.part_size);
    let mut parts = futures::stream::iter(ranges)
        .map(|range| {
            let handle = temp.reopen();
            async move { fetch_part(store, object, handle?, range, tracker, observer).await }
        })
        .buffer_unordered(config.concurrency.max(1));

    // Returning early drops the remaining in-flight parts.
    while let Some(part) = parts.next().await {
        part?;
    }
    Ok(())
}

/// Write one range through its own file handle positioned at the range start
async fn fetch_part(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    file: std::fs::File,
    range: Range<u64>,
    tracker: &ProgressTracker,
    observer: &dyn ProgressObserver,
) -> Result<()> {
    let expected = range.end - range.start;
    let mut file = tokio::fs::File::from_std(file);
    file.seek(SeekFrom::Start(range.start)).await?;

    let mut chunks = store.get_range(object, range.clone()).await?;
    let mut received = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        received += chunk.len() as u64;
        if received > expected {
            return Err(Error::Protocol(format!(
                "{object}: range {}-{} returned more than {expected} bytes",
                range.start, range.end
            )));
        }

        file.write_all(&chunk).await?;
        observer.on_progress(tracker.record(chunk.len() as u64));
    }

    if received != expected {
        return Err(Error::Protocol(format!(
            "{object}: range {}-{} ended after {received} of {expected} bytes",
            range.start, range.end
        )));
    }

    file.flush().await?;
    Ok(())
}

/// Remove a temporary file after a failed download
fn discard(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}

//! Streaming writer: body stream to `<destination>.part`, then atomic publish.

use std::path::{Path, PathBuf};
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::{CHUNK_SIZE, PROGRESS_INTERVAL};
use super::error::DownloadError;
use super::filename::part_path;
use super::progress::{ProgressReporter, ProgressThrottle};

/// Result of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    /// Final, published path.
    pub path: PathBuf,
    /// Bytes written to the file.
    pub bytes_written: u64,
}

/// Copies `body` into `sink` in slices of at most [`CHUNK_SIZE`] bytes.
///
/// Progress is reported through `reporter`, throttled to one update per
/// [`PROGRESS_INTERVAL`]. `source_url` and `sink_path` only label errors.
///
/// # Errors
///
/// Returns `DownloadError::Stream` when the body yields an error and
/// `DownloadError::Io` when the sink rejects a write. Bytes already written
/// stay in the sink.
pub async fn copy_stream<S, B, E, W>(
    body: S,
    sink: &mut W,
    total: Option<u64>,
    reporter: &mut dyn ProgressReporter,
    source_url: &str,
    sink_path: &Path,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
    W: AsyncWrite + Unpin,
{
    let mut body = pin!(body);
    let mut throttle = ProgressThrottle::new(PROGRESS_INTERVAL);
    let mut written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| DownloadError::stream(source_url, e))?;
        for slice in chunk.as_ref().chunks(CHUNK_SIZE) {
            sink.write_all(slice)
                .await
                .map_err(|e| DownloadError::io(sink_path, e))?;
            written += slice.len() as u64;
            if throttle.ready() {
                reporter.update(written, total);
            }
        }
    }

    Ok(written)
}

/// Streams a response body to `destination` via `<destination>.part`.
///
/// Parent directories are created first. The `.part` file is flushed even
/// when the copy fails and is left in place; the final name only appears
/// after the byte count matched `content_length` (when declared).
///
/// # Errors
///
/// - `DownloadError::Io` when a directory, the `.part` file, a write, the
///   flush or the rename fails
/// - `DownloadError::Stream` when reading the body fails
/// - `DownloadError::Integrity` when the byte count differs from `content_length`
#[instrument(skip(body, reporter), fields(destination = %destination.display()))]
pub async fn write_response_body<S, B, E>(
    body: S,
    content_length: Option<u64>,
    destination: &Path,
    source_url: &str,
    reporter: &mut dyn ProgressReporter,
) -> Result<WriteSummary, DownloadError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    if let Some(parent) = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloadError::io(parent, e))?;
    }

    let part = part_path(destination);
    let file = File::create(&part)
        .await
        .map_err(|e| DownloadError::io(&part, e))?;
    debug!(part = %part.display(), "writing to in-progress file");

    reporter.start(content_length);
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let copied = copy_stream(
        body,
        &mut writer,
        content_length,
        reporter,
        source_url,
        &part,
    )
    .await;
    let flushed = writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(&part, e));
    drop(writer);

    let bytes_written = match (copied, flushed) {
        (Ok(bytes), Ok(())) => bytes,
        (Err(error), _) | (Ok(_), Err(error)) => {
            reporter.abandon();
            warn!(part = %part.display(), error = %error, "transfer aborted, partial file kept");
            return Err(error);
        }
    };

    if let Some(expected) = content_length
        && expected != bytes_written
    {
        reporter.abandon();
        return Err(DownloadError::integrity(&part, expected, bytes_written));
    }

    tokio::fs::rename(&part, destination)
        .await
        .map_err(|e| DownloadError::io(destination, e))?;
    reporter.finish(bytes_written, content_length);

    info!(
        path = %destination.display(),
        bytes = bytes_written,
        "download complete"
    );

    Ok(WriteSummary {
        path: destination.to_path_buf(),
        bytes_written,
    })
}

//! Progress reporting for the streaming writer.
//!
//! The writer asks a [`ProgressThrottle`] before every update, so a reporter
//! sees at most one update per [`PROGRESS_INTERVAL`](super::constants::PROGRESS_INTERVAL)
//! regardless of how small the body chunks are.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Instant;

/// Sink for download progress.
pub trait ProgressReporter: Send {
    /// Called once before the first byte is written.
    fn start(&mut self, _total: Option<u64>) {}

    /// Called with the running byte count, already throttled.
    fn update(&mut self, downloaded: u64, total: Option<u64>);

    /// Called once after the file has been published.
    fn finish(&mut self, _downloaded: u64, _total: Option<u64>) {}

    /// Called when the transfer stops with an error.
    fn abandon(&mut self) {}
}

/// Elapsed-time gate for progress updates.
///
/// The first call always passes; later calls pass once `interval` has
/// elapsed since the last one that did.
#[derive(Debug)]
pub struct ProgressThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ProgressThrottle {
    /// Creates a throttle with the given minimum spacing.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true when an update may be emitted now.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Reporter used in quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&mut self, _downloaded: u64, _total: Option<u64>) {}
}

/// Formats one progress line: a percentage when the total is known,
/// the raw byte count otherwise.
#[must_use]
pub fn format_progress(downloaded: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let percent = downloaded.saturating_mul(100) / total;
            format!("{percent:>3}% ({downloaded}/{total} bytes)")
        }
        _ => format!("{downloaded} bytes"),
    }
}

/// Plain-text reporter that overwrites its line with `\r`.
///
/// Used when stderr is not a terminal, and in tests with a `Vec<u8>` sink.
#[derive(Debug)]
pub struct LineProgress<W: Write + Send> {
    sink: W,
    updates: usize,
}

impl<W: Write + Send> LineProgress<W> {
    /// Wraps a writer.
    pub fn new(sink: W) -> Self {
        Self { sink, updates: 0 }
    }

    /// Number of progress lines written so far.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> ProgressReporter for LineProgress<W> {
    fn update(&mut self, downloaded: u64, total: Option<u64>) {
        self.updates += 1;
        // Progress output is best-effort; a closed stderr must not abort the download.
        let _ = write!(self.sink, "\r{}", format_progress(downloaded, total));
        let _ = self.sink.flush();
    }

    fn finish(&mut self, downloaded: u64, total: Option<u64>) {
        let _ = writeln!(self.sink, "\r{}", format_progress(downloaded, total));
        let _ = self.sink.flush();
    }

    fn abandon(&mut self) {
        let _ = writeln!(self.sink);
        let _ = self.sink.flush();
    }
}

/// Terminal progress bar.
pub struct IndicatifProgress {
    bar: ProgressBar,
}

impl IndicatifProgress {
    /// Creates a hidden bar; it becomes visible on [`ProgressReporter::start`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifProgress {
    fn start(&mut self, total: Option<u64>) {
        self.bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{percent:>3}% [{bar:40}] {bytes}/{total_bytes} {bytes_per_sec} eta {eta}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner} {bytes} {bytes_per_sec}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar
            }
        };
    }

    fn update(&mut self, downloaded: u64, _total: Option<u64>) {
        self.bar.set_position(downloaded);
    }

    fn finish(&mut self, downloaded: u64, _total: Option<u64>) {
        self.bar.set_position(downloaded);
        self.bar.finish();
    }

    fn abandon(&mut self) {
        self.bar.abandon();
    }
}

/// Picks the reporter for a run: none when quiet, a bar on a terminal,
/// `\r` lines on stderr otherwise.
#[must_use]
pub fn default_reporter(quiet: bool) -> Box<dyn ProgressReporter> {
    if quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(IndicatifProgress::new())
    } else {
        Box::new(LineProgress::new(std::io::stderr()))
    }
}

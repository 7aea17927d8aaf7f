use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::error::{AggregateError, ReportError};
use crate::models::ReportOutcome;
use crate::parser::LineParser;

/// Tuning for a report run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Buffer size for reading the log file
    pub buffer_size: usize,
    /// Emit a warning for every skipped line
    pub warn_on_skip: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024, // 64KB
            warn_on_skip: true,
        }
    }
}

/// Lines consumed so far, before the summary is finalized
#[derive(Debug, Default)]
pub struct RunTally {
    pub aggregator: Aggregator,
    pub lines_read: u64,
    pub unparsable_lines: u64,
    pub invalid_lines: u64,
}

impl RunTally {
    pub fn finish(self, processing_duration: Duration) -> Result<ReportOutcome, ReportError> {
        let RunTally { aggregator, unparsable_lines, invalid_lines, .. } = self;
        let summary = aggregator.finalize(processing_duration)?;
        Ok(ReportOutcome { summary, unparsable_lines, invalid_lines })
    }
}

/// Single-pass report over one access log
#[derive(Debug, Clone, Default)]
pub struct LogReport {
    parser: LineParser,
    config: ReportConfig,
}

impl LogReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReportConfig) -> Self {
        Self { parser: LineParser::default(), config }
    }

    /// Read every line from `reader`, in order, and fold the matching ones
    /// into a fresh aggregator. Unparsable and invalid lines are skipped.
    pub fn process_reader<R: Read>(&self, reader: R) -> Result<RunTally, ReportError> {
        let mut reader = BufReader::with_capacity(self.config.buffer_size, reader);
        let mut tally = RunTally::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let line_number = tally.lines_read as usize + 1;
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| ReportError::Io { line_number, source })?;
            if read == 0 {
                break;
            }
            tally.lines_read += 1;

            let line = String::from_utf8_lossy(&buf);
            let Some(parsed) = self.parser.parse(&line) else {
                tally.unparsable_lines += 1;
                if self.config.warn_on_skip {
                    warn!(line_number, "line does not match the combined+ format, skipped");
                }
                continue;
            };

            match tally.aggregator.ingest(&parsed) {
                Ok(()) => {}
                Err(AggregateError::InvalidField { field, value }) => {
                    tally.invalid_lines += 1;
                    if self.config.warn_on_skip {
                        warn!(line_number, %field, value = %value, "non-numeric field, line skipped");
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(
            lines_read = tally.lines_read,
            parsed = tally.aggregator.line_count(),
            unparsable = tally.unparsable_lines,
            invalid = tally.invalid_lines,
            "finished reading log"
        );
        Ok(tally)
    }

    /// Full run over a file: access check, read, aggregate, finalize.
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<ReportOutcome, ReportError> {
        let path = path.as_ref();
        let file = open_readable(path)?;
        info!(path = %path.display(), "processing access log");

        let started = Instant::now();
        let tally = self.process_reader(file)?;
        let outcome = tally.finish(started.elapsed())?;

        info!(
            lines = outcome.summary.lines_parsed,
            skipped = outcome.skipped_lines(),
            elapsed = %humantime::format_duration(outcome.summary.processing_duration),
            "report complete"
        );
        Ok(outcome)
    }
}

/// Open `path` for reading, or fail with `FileAccess`
pub fn open_readable(path: &Path) -> Result<File, ReportError> {
    let file = File::open(path).map_err(|source| ReportError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    // directories open fine on unix but fail on first read
    match file.metadata() {
        Ok(meta) if meta.is_dir() => Err(ReportError::FileAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "is a directory"),
        }),
        _ => Ok(file),
    }
}

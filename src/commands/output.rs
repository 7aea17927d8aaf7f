use crate::cli::OutputFormat;
use crate::error::ReportError;
use crate::models::{ReportOutcome, SummaryReport};
use colored::*;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Renders a finished report in the selected output format
pub struct ReportFormatter {
    format: OutputFormat,
    color: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format, color: false }
    }

    pub fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    pub fn write_outcome(&self, writer: &mut impl Write, outcome: &ReportOutcome) -> Result<(), ReportError> {
        match self.format {
            OutputFormat::Table => self.write_table(writer, outcome).map_err(output_error),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, outcome).map_err(output_error)?;
                writeln!(writer).map_err(output_error)
            }
            OutputFormat::Csv => write_csv(writer, outcome),
        }
    }

    fn label(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn write_table(&self, w: &mut impl Write, outcome: &ReportOutcome) -> std::io::Result<()> {
        let s: &SummaryReport = &outcome.summary;
        writeln!(w, "{} {}", self.label("Number of lines parsed:"), s.lines_parsed)?;
        writeln!(w, "{} {}", self.label("Duration of processing:"), format_elapsed(s.processing_duration))?;
        writeln!(w)?;
        writeln!(w, "{} {}", self.label("Most requested page:"), s.most_requested_page)?;
        writeln!(w, "{} {}", self.label("Most frequent visitor:"), s.most_frequent_visitor)?;
        if s.top_pages.len() > 1 {
            writeln!(w, "{}", self.label("Top pages:"))?;
            for (page, hits) in &s.top_pages {
                writeln!(w, "  {:>8}  {}", hits, page)?;
            }
        }
        writeln!(w)?;
        writeln!(w, "{} {} ms", self.label("Min page load time:"), s.load_time.min_ms)?;
        writeln!(w, "{} {:.2} ms", self.label("Average page load time:"), s.load_time.mean_ms)?;
        writeln!(w, "{} {} ms", self.label("Max page load time:"), s.load_time.max_ms)?;
        writeln!(w)?;

        let errors = if self.color && s.error_count > 0 {
            s.error_count.to_string().red().to_string()
        } else {
            s.error_count.to_string()
        };
        writeln!(w, "{} {}", self.label("Number of errors:"), errors)?;
        writeln!(w, "{} {} bytes", self.label("Total data transferred:"), s.total_bytes)?;

        if outcome.skipped_lines() > 0 {
            writeln!(w)?;
            writeln!(
                w,
                "{} {} (unparsable {}, invalid {})",
                self.label("Skipped lines:"),
                outcome.skipped_lines(),
                outcome.unparsable_lines,
                outcome.invalid_lines
            )?;
        }

        if let Some(span) = &s.time_span {
            let length = span
                .length()
                .to_std()
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_else(|_| "0s".to_string());
            writeln!(
                w,
                "{} {} .. {} ({})",
                self.label("Log time span:"),
                span.first.to_rfc3339(),
                span.last.to_rfc3339(),
                length
            )?;
        }
        Ok(())
    }
}

/// Elapsed time rounded to microseconds for display
pub fn format_elapsed(elapsed: Duration) -> String {
    let micros = Duration::from_micros(elapsed.as_micros() as u64);
    humantime::format_duration(micros).to_string()
}

#[derive(Serialize)]
struct CsvRow<'a> {
    lines_parsed: u64,
    processing_seconds: f64,
    most_requested_page: &'a str,
    most_frequent_visitor: &'a str,
    min_load_time_ms: i64,
    avg_load_time_ms: f64,
    max_load_time_ms: i64,
    error_count: u64,
    total_bytes: u64,
    unparsable_lines: u64,
    invalid_lines: u64,
}

fn write_csv(writer: &mut impl Write, outcome: &ReportOutcome) -> Result<(), ReportError> {
    let s = &outcome.summary;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .serialize(CsvRow {
            lines_parsed: s.lines_parsed,
            processing_seconds: s.processing_duration.as_secs_f64(),
            most_requested_page: &s.most_requested_page,
            most_frequent_visitor: &s.most_frequent_visitor,
            min_load_time_ms: s.load_time.min_ms,
            avg_load_time_ms: s.load_time.mean_ms,
            max_load_time_ms: s.load_time.max_ms,
            error_count: s.error_count,
            total_bytes: s.total_bytes,
            unparsable_lines: outcome.unparsable_lines,
            invalid_lines: outcome.invalid_lines,
        })
        .map_err(output_error)?;
    csv_writer.flush().map_err(output_error)
}

fn output_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Output(e.to_string())
}

use chrono::{DateTime, FixedOffset};
use std::num::IntErrorKind;
use std::time::Duration;
use tracing::debug;

use crate::error::AggregateError;
use crate::models::{LogField, ParsedLine, SummaryReport, TimeSpan};
use crate::parser::normalize_response_size;
use crate::statistics::{load_time_stats, FrequencyTable};

/// Status codes counted as successful responses
pub const SUCCESS_STATUSES: [&str; 4] = ["200", "201", "202", "204"];

/// Number of pages listed in `SummaryReport::top_pages`
pub const TOP_PAGES: usize = 5;

/// Apache `%t` timestamp layout
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Running totals for one report run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    pub line_count: u64,
    pub total_bytes: u64,
    pub request_counts: FrequencyTable,
    pub visitor_counts: FrequencyTable,
    pub load_times: Vec<i64>,
    pub error_count: u64,
    pub first_seen: Option<DateTime<FixedOffset>>,
    pub last_seen: Option<DateTime<FixedOffset>>,
}

/// Streaming accumulator: `ingest` every parsed line, then `finalize` once.
///
/// `finalize` takes the aggregator by value, so nothing can be ingested
/// after the summary has been produced.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    state: AggregateState,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn line_count(&self) -> u64 {
        self.state.line_count
    }

    /// Fold one parsed line into the running totals.
    ///
    /// Numeric fields are validated first; on `InvalidField` the state is
    /// left untouched and the line counts for nothing. Byte sizes too large
    /// for `u64` saturate instead of failing.
    pub fn ingest(&mut self, line: &ParsedLine<'_>) -> Result<(), AggregateError> {
        let bytes = parse_bytes(normalize_response_size(line.response_bytes))?;
        let duration_ms = parse_duration(line.duration_ms)?;

        let state = &mut self.state;
        state.line_count += 1;
        state.total_bytes = state.total_bytes.saturating_add(bytes);
        state.request_counts.record(line.resource);
        state.visitor_counts.record(line.client);
        state.load_times.push(duration_ms);
        if !SUCCESS_STATUSES.contains(&line.status) {
            state.error_count += 1;
        }

        match DateTime::parse_from_str(line.timestamp, TIMESTAMP_FORMAT) {
            Ok(ts) => {
                if state.first_seen.map_or(true, |first| ts < first) {
                    state.first_seen = Some(ts);
                }
                if state.last_seen.map_or(true, |last| ts > last) {
                    state.last_seen = Some(ts);
                }
            }
            Err(e) => debug!(timestamp = line.timestamp, error = %e, "timestamp not parsed, skipped for time span"),
        }

        Ok(())
    }

    /// Produce the summary. Fails with `EmptyLog` if nothing was ingested.
    pub fn finalize(self, processing_duration: Duration) -> Result<SummaryReport, AggregateError> {
        let state = self.state;
        let load_time = load_time_stats(&state.load_times).ok_or(AggregateError::EmptyLog)?;
        let (most_requested_page, _) = state.request_counts.most_frequent().ok_or(AggregateError::EmptyLog)?;
        let (most_frequent_visitor, _) = state.visitor_counts.most_frequent().ok_or(AggregateError::EmptyLog)?;

        let time_span = match (state.first_seen, state.last_seen) {
            (Some(first), Some(last)) => Some(TimeSpan { first, last }),
            _ => None,
        };

        Ok(SummaryReport {
            lines_parsed: state.line_count,
            processing_duration,
            most_requested_page: most_requested_page.to_string(),
            top_pages: state
                .request_counts
                .top(TOP_PAGES)
                .into_iter()
                .map(|(page, hits)| (page.to_string(), hits))
                .collect(),
            most_frequent_visitor: most_frequent_visitor.to_string(),
            load_time,
            error_count: state.error_count,
            total_bytes: state.total_bytes,
            distinct_pages: state.request_counts.len(),
            distinct_visitors: state.visitor_counts.len(),
            time_span,
        })
    }
}

/// Normalized sizes are all digits, so the only parse failure is overflow
fn parse_bytes(value: &str) -> Result<u64, AggregateError> {
    match value.parse::<u64>() {
        Ok(bytes) => Ok(bytes),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u64::MAX),
        Err(_) => Err(invalid_field(LogField::ResponseBytes, value)),
    }
}

fn parse_duration(value: &str) -> Result<i64, AggregateError> {
    value
        .parse::<i64>()
        .map_err(|_| invalid_field(LogField::DurationMs, value))
}

fn invalid_field(field: LogField, value: &str) -> AggregateError {
    AggregateError::InvalidField {
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineParser;

    const SCENARIO_LINE: &str = r#"175.205.95.170 - - [18/Apr/2017:15:04:36 -0500] "GET /kms//wscore/check/json/ HTTP/1.0" 200 5035 "https://app.wellspring.com/kms/querybuilder/results/csv/" "Mozilla/5.0 (...) Firefox/13.0" 2358"#;

    fn line(client: &str, resource: &str, status: &str, bytes: &str, duration: &str) -> String {
        format!(
            r#"{} - - [18/Apr/2017:15:04:36 -0500] "GET {} HTTP/1.1" {} {} "-" "test-agent/1.0" {}"#,
            client, resource, status, bytes, duration
        )
    }

    fn ingest_all(aggregator: &mut Aggregator, lines: &[String]) {
        let parser = LineParser::default();
        for raw in lines {
            let parsed = parser.parse(raw).expect("fixture line should parse");
            aggregator.ingest(&parsed).expect("fixture line should ingest");
        }
    }

    #[test]
    fn test_single_line_scenario() {
        let parser = LineParser::default();
        let parsed = parser.parse(SCENARIO_LINE).unwrap();
        assert_eq!(parsed.resource, "/kms//wscore/check/json/");
        assert_eq!(parsed.status, "200");
        assert_eq!(parsed.response_bytes, "5035");
        assert_eq!(parsed.duration_ms, "2358");

        let mut aggregator = Aggregator::new();
        aggregator.ingest(&parsed).unwrap();
        let summary = aggregator.finalize(Duration::ZERO).unwrap();

        assert_eq!(summary.lines_parsed, 1);
        assert_eq!(summary.load_time.min_ms, 2358);
        assert_eq!(summary.load_time.mean_ms, 2358.0);
        assert_eq!(summary.load_time.max_ms, 2358);
        assert_eq!(summary.error_count, 0);
        assert_eq!(summary.total_bytes, 5035);
        assert_eq!(summary.most_requested_page, "/kms//wscore/check/json/");
        assert_eq!(summary.most_frequent_visitor, "175.205.95.170");
    }

    #[test]
    fn test_finalize_without_lines_is_empty_log() {
        let result = Aggregator::new().finalize(Duration::from_secs(1));
        assert_eq!(result, Err(AggregateError::EmptyLog));
    }

    #[test]
    fn test_error_statuses_are_counted() {
        let mut aggregator = Aggregator::new();
        let lines: Vec<String> = ["200", "201", "202", "204", "203", "301", "404", "500"]
            .iter()
            .map(|status| line("10.0.0.1", "/", status, "1", "1"))
            .collect();
        ingest_all(&mut aggregator, &lines);
        assert_eq!(aggregator.state().error_count, 4);
    }

    #[test]
    fn test_dash_bytes_count_as_zero() {
        let mut aggregator = Aggregator::new();
        ingest_all(
            &mut aggregator,
            &[line("10.0.0.1", "/", "304", "-", "3"), line("10.0.0.1", "/", "200", "20", "3")],
        );
        assert_eq!(aggregator.state().total_bytes, 20);
    }

    #[test]
    fn test_non_numeric_duration_leaves_state_untouched() {
        let parser = LineParser::default();
        let raw = line("10.0.0.1", "/slow", "200", "100", "n/a");
        let parsed = parser.parse(&raw).unwrap();

        let mut aggregator = Aggregator::new();
        let before = aggregator.state().clone();
        let err = aggregator.ingest(&parsed).unwrap_err();

        assert_eq!(
            err,
            AggregateError::InvalidField { field: LogField::DurationMs, value: "n/a".to_string() }
        );
        assert_eq!(aggregator.state(), &before);
    }

    #[test]
    fn test_overflowing_bytes_saturate() {
        let mut aggregator = Aggregator::new();
        ingest_all(
            &mut aggregator,
            &[
                line("10.0.0.1", "/", "200", "99999999999999999999999", "1"),
                line("10.0.0.1", "/", "200", "10", "1"),
            ],
        );
        assert_eq!(aggregator.line_count(), 2);
        assert_eq!(aggregator.state().total_bytes, u64::MAX);
    }

    #[test]
    fn test_negative_duration_is_ingested() {
        let mut aggregator = Aggregator::new();
        ingest_all(
            &mut aggregator,
            &[line("10.0.0.1", "/", "200", "1", "-5"), line("10.0.0.1", "/", "200", "1", "15")],
        );
        assert_eq!(aggregator.line_count(), 2);

        let summary = aggregator.finalize(Duration::ZERO).unwrap();
        assert_eq!(summary.load_time.min_ms, -5);
        assert_eq!(summary.load_time.max_ms, 15);
        assert_eq!(summary.load_time.mean_ms, 5.0);
    }

    #[test]
    fn test_top_pages_are_ranked() {
        let mut aggregator = Aggregator::new();
        let lines: Vec<String> = ["/a", "/b", "/b", "/c", "/d", "/e", "/f", "/c", "/b"]
            .iter()
            .map(|page| line("10.0.0.1", page, "200", "1", "1"))
            .collect();
        ingest_all(&mut aggregator, &lines);

        let summary = aggregator.finalize(Duration::ZERO).unwrap();
        let top: Vec<(&str, u64)> = summary.top_pages.iter().map(|(p, n)| (p.as_str(), *n)).collect();
        assert_eq!(top, vec![("/b", 3), ("/c", 2), ("/a", 1), ("/d", 1), ("/e", 1)]);
        assert_eq!(summary.top_pages[0].0, summary.most_requested_page);
    }

    #[test]
    fn test_most_requested_and_visitor_tie_break() {
        let mut aggregator = Aggregator::new();
        ingest_all(
            &mut aggregator,
            &[
                line("10.0.0.2", "/b", "200", "1", "10"),
                line("10.0.0.1", "/a", "200", "1", "20"),
                line("10.0.0.1", "/a", "200", "1", "30"),
                line("10.0.0.2", "/b", "200", "1", "40"),
            ],
        );
        let summary = aggregator.finalize(Duration::ZERO).unwrap();
        assert_eq!(summary.most_requested_page, "/b");
        assert_eq!(summary.most_frequent_visitor, "10.0.0.2");
        assert_eq!(summary.load_time.mean_ms, 25.0);
        assert_eq!(summary.distinct_pages, 2);
        assert_eq!(summary.distinct_visitors, 2);
    }

    #[test]
    fn test_time_span_tracks_earliest_and_latest() {
        let parser = LineParser::default();
        let raws = [
            r#"1.1.1.1 - - [18/Apr/2017:15:04:36 -0500] "GET / HTTP/1.1" 200 1 "-" "ua" 1"#,
            r#"1.1.1.1 - - [18/Apr/2017:14:00:00 -0500] "GET / HTTP/1.1" 200 1 "-" "ua" 1"#,
            r#"1.1.1.1 - - [not-a/date +0000] "GET / HTTP/1.1" 200 1 "-" "ua" 1"#,
            r#"1.1.1.1 - - [18/Apr/2017:16:30:00 -0500] "GET / HTTP/1.1" 200 1 "-" "ua" 1"#,
        ];
        let mut aggregator = Aggregator::new();
        for raw in raws {
            aggregator.ingest(&parser.parse(raw).unwrap()).unwrap();
        }
        let summary = aggregator.finalize(Duration::ZERO).unwrap();
        let span = summary.time_span.unwrap();

        assert_eq!(summary.lines_parsed, 4);
        assert_eq!(span.first.to_rfc3339(), "2017-04-18T14:00:00-05:00");
        assert_eq!(span.last.to_rfc3339(), "2017-04-18T16:30:00-05:00");
        assert_eq!(span.length().num_minutes(), 150);
    }
}

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The twelve fields of a combined+ access log line, in line order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogField {
    Client,
    RemoteUser,
    AuthRemoteUser,
    Timestamp,
    Method,
    Resource,
    Protocol,
    Status,
    ResponseBytes,
    Referer,
    UserAgent,
    DurationMs,
}

impl LogField {
    pub const ALL: [LogField; 12] = [
        LogField::Client,
        LogField::RemoteUser,
        LogField::AuthRemoteUser,
        LogField::Timestamp,
        LogField::Method,
        LogField::Resource,
        LogField::Protocol,
        LogField::Status,
        LogField::ResponseBytes,
        LogField::Referer,
        LogField::UserAgent,
        LogField::DurationMs,
    ];

    /// Named capture group used by the line grammar
    pub fn capture_name(&self) -> &'static str {
        match self {
            LogField::Client => "client",
            LogField::RemoteUser => "remote_user",
            LogField::AuthRemoteUser => "auth_remote_user",
            LogField::Timestamp => "datetime",
            LogField::Method => "method",
            LogField::Resource => "request",
            LogField::Protocol => "version",
            LogField::Status => "status",
            LogField::ResponseBytes => "size_response_in_bytes",
            LogField::Referer => "referer",
            LogField::UserAgent => "user_agent",
            LogField::DurationMs => "request_time_in_ms",
        }
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capture_name())
    }
}

/// One successfully matched log line. Fields borrow from the raw line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLine<'a> {
    pub client: &'a str,
    pub remote_user: &'a str,
    pub auth_remote_user: &'a str,
    pub timestamp: &'a str,
    pub method: &'a str,
    pub resource: &'a str,
    pub protocol: &'a str,
    pub status: &'a str,
    pub response_bytes: &'a str,
    pub referer: &'a str,
    pub user_agent: &'a str,
    pub duration_ms: &'a str,
}

impl<'a> ParsedLine<'a> {
    pub fn get(&self, field: LogField) -> &'a str {
        match field {
            LogField::Client => self.client,
            LogField::RemoteUser => self.remote_user,
            LogField::AuthRemoteUser => self.auth_remote_user,
            LogField::Timestamp => self.timestamp,
            LogField::Method => self.method,
            LogField::Resource => self.resource,
            LogField::Protocol => self.protocol,
            LogField::Status => self.status,
            LogField::ResponseBytes => self.response_bytes,
            LogField::Referer => self.referer,
            LogField::UserAgent => self.user_agent,
            LogField::DurationMs => self.duration_ms,
        }
    }

    /// Field/value pairs in grammar order
    pub fn fields(&self) -> impl Iterator<Item = (LogField, &'a str)> + '_ {
        LogField::ALL.iter().map(move |&field| (field, self.get(field)))
    }

    /// Render the fields back into the combined+ line template
    pub fn render(&self) -> String {
        format!(
            "{} {} {} [{}] \"{} {} {}\" {} {} \"{}\" \"{}\" {}",
            self.client,
            self.remote_user,
            self.auth_remote_user,
            self.timestamp,
            self.method,
            self.resource,
            self.protocol,
            self.status,
            self.response_bytes,
            self.referer,
            self.user_agent,
            self.duration_ms,
        )
    }
}

/// Min/mean/max over all recorded page load times, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadTimeStats {
    pub min_ms: i64,
    pub mean_ms: f64,
    pub max_ms: i64,
}

/// Earliest and latest request timestamps seen in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub first: DateTime<FixedOffset>,
    pub last: DateTime<FixedOffset>,
}

impl TimeSpan {
    pub fn length(&self) -> chrono::Duration {
        self.last.signed_duration_since(self.first)
    }
}

/// Final statistics for one log file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub lines_parsed: u64,
    #[serde(with = "duration_secs")]
    pub processing_duration: Duration,
    pub most_requested_page: String,
    /// Most requested pages with their hit counts, highest first
    pub top_pages: Vec<(String, u64)>,
    pub most_frequent_visitor: String,
    pub load_time: LoadTimeStats,
    pub error_count: u64,
    pub total_bytes: u64,
    pub distinct_pages: usize,
    pub distinct_visitors: usize,
    pub time_span: Option<TimeSpan>,
}

/// A summary plus the accounting of lines that did not contribute to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub summary: SummaryReport,
    pub unparsable_lines: u64,
    pub invalid_lines: u64,
}

impl ReportOutcome {
    pub fn skipped_lines(&self) -> u64 {
        self.unparsable_lines + self.invalid_lines
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParsedLine<'static> {
        ParsedLine {
            client: "10.0.0.1",
            remote_user: "-",
            auth_remote_user: "frank",
            timestamp: "10/Oct/2000:13:55:36 -0700",
            method: "GET",
            resource: "/index.html",
            protocol: "HTTP/1.1",
            status: "404",
            response_bytes: "-",
            referer: "-",
            user_agent: "curl/8.0 (x86_64)",
            duration_ms: "12",
        }
    }

    #[test]
    fn test_capture_names_are_unique() {
        let mut names: Vec<_> = LogField::ALL.iter().map(|f| f.capture_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LogField::ALL.len());
    }

    #[test]
    fn test_fields_follow_grammar_order() {
        let line = sample();
        let fields: Vec<_> = line.fields().collect();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[0], (LogField::Client, "10.0.0.1"));
        assert_eq!(fields[5], (LogField::Resource, "/index.html"));
        assert_eq!(fields[11], (LogField::DurationMs, "12"));
    }

    #[test]
    fn test_render_matches_template() {
        assert_eq!(
            sample().render(),
            "10.0.0.1 - frank [10/Oct/2000:13:55:36 -0700] \"GET /index.html HTTP/1.1\" 404 - \"-\" \"curl/8.0 (x86_64)\" 12"
        );
    }

    #[test]
    fn test_summary_serializes_duration_as_seconds() {
        let summary = SummaryReport {
            lines_parsed: 1,
            processing_duration: Duration::from_millis(1500),
            most_requested_page: "/".to_string(),
            top_pages: vec![("/".to_string(), 1)],
            most_frequent_visitor: "10.0.0.1".to_string(),
            load_time: LoadTimeStats { min_ms: 5, mean_ms: 5.0, max_ms: 5 },
            error_count: 0,
            total_bytes: 10,
            distinct_pages: 1,
            distinct_visitors: 1,
            time_span: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["processing_duration"], serde_json::json!(1.5));

        let back: SummaryReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }
}

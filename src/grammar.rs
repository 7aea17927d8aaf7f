use regex::{Captures, Regex};

use crate::error::GrammarError;
use crate::models::{LogField, ParsedLine};

/// Apache combined log format with the request duration (`%D`) appended:
/// `%h %l %u %t "%r" %>s %b "%{Referer}i" "%{User-agent}i" %D`
pub const COMBINED_PLUS_PATTERN: &str = concat!(
    r#"^(?P<client>\S+) (?P<remote_user>\S+) (?P<auth_remote_user>\S+) "#,
    r#"\[(?P<datetime>\S+ \S+)\] "#,
    r#""(?P<method>\S+) (?P<request>\S+) (?P<version>\S+)" "#,
    r#"(?P<status>\S+) (?P<size_response_in_bytes>\S+) "#,
    r#""(?P<referer>\S+)" "(?P<user_agent>.*)" "#,
    r#"(?P<request_time_in_ms>\S+)"#,
);

/// Compiled line grammar. Build once, match every line against it.
#[derive(Debug, Clone)]
pub struct LogLineGrammar {
    pattern: Regex,
}

impl LogLineGrammar {
    /// The fixed combined+ grammar
    pub fn combined_plus() -> Self {
        Self::compile(COMBINED_PLUS_PATTERN).expect("combined+ pattern is a valid grammar")
    }

    /// Compile a pattern, requiring a capture group for every `LogField`
    pub(crate) fn compile(pattern: &str) -> Result<Self, GrammarError> {
        let pattern = Regex::new(pattern)?;
        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        if let Some(missing) = LogField::ALL
            .iter()
            .find(|field| !names.contains(&field.capture_name()))
        {
            return Err(GrammarError::MissingCapture(*missing));
        }
        Ok(Self { pattern })
    }

    /// Match `line` from its start. Either every field is captured or `None`.
    pub fn captures<'a>(&self, line: &'a str) -> Option<ParsedLine<'a>> {
        let caps = self.pattern.captures(line)?;
        Some(ParsedLine {
            client: field(&caps, LogField::Client)?,
            remote_user: field(&caps, LogField::RemoteUser)?,
            auth_remote_user: field(&caps, LogField::AuthRemoteUser)?,
            timestamp: field(&caps, LogField::Timestamp)?,
            method: field(&caps, LogField::Method)?,
            resource: field(&caps, LogField::Resource)?,
            protocol: field(&caps, LogField::Protocol)?,
            status: field(&caps, LogField::Status)?,
            response_bytes: field(&caps, LogField::ResponseBytes)?,
            referer: field(&caps, LogField::Referer)?,
            user_agent: field(&caps, LogField::UserAgent)?,
            duration_ms: field(&caps, LogField::DurationMs)?,
        })
    }
}

impl Default for LogLineGrammar {
    fn default() -> Self {
        Self::combined_plus()
    }
}

fn field<'a>(caps: &Captures<'a>, field: LogField) -> Option<&'a str> {
    caps.name(field.capture_name()).map(|m| m.as_str())
}

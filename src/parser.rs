use crate::grammar::LogLineGrammar;
use crate::models::ParsedLine;

/// Servers log a zero-byte response body as a single dash
pub const NO_CONTENT_SENTINEL: &str = "-";

/// Extracts the named fields of one log line using a fixed grammar
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    grammar: LogLineGrammar,
}

impl LineParser {
    pub fn new(grammar: LogLineGrammar) -> Self {
        Self { grammar }
    }

    /// Parse one raw line, trailing newline included or not.
    ///
    /// Returns `None` when the line does not conform to the grammar. That is
    /// a normal outcome for foreign or truncated lines, not an error.
    pub fn parse<'a>(&self, line: &'a str) -> Option<ParsedLine<'a>> {
        self.grammar.captures(line)
    }
}

/// Normalise the response size field: the sentinel and any non-decimal value
/// become `"0"`, decimal digit strings pass through unchanged.
pub fn normalize_response_size(value: &str) -> &str {
    if value != NO_CONTENT_SENTINEL && is_decimal(value) {
        value
    } else {
        "0"
    }
}

fn is_decimal(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

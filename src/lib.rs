pub mod models;
pub mod error;
pub mod grammar;
pub mod parser;
pub mod statistics;
pub mod aggregator;
pub mod report;
pub mod logging;
pub mod cli;
pub mod commands;


pub use models::*;
pub use error::{AggregateError, GrammarError, ReportError};
pub use grammar::LogLineGrammar;
pub use parser::{normalize_response_size, LineParser};
pub use statistics::FrequencyTable;
pub use aggregator::{AggregateState, Aggregator};
pub use report::{LogReport, ReportConfig, RunTally};

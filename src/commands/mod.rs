pub mod report;
pub mod output;

pub use report::run_report;
pub use output::ReportFormatter;

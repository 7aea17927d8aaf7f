use crate::cli::Cli;
use crate::commands::output::ReportFormatter;
use crate::error::ReportError;
use crate::report::{LogReport, ReportConfig};
use std::io::{stdout, IsTerminal, Write};

pub fn run_report(cli: &Cli) -> Result<(), ReportError> {
    let report = LogReport::with_config(ReportConfig {
        buffer_size: cli.buffer_kb.max(1) * 1024,
        warn_on_skip: !cli.quiet,
    });
    let outcome = report.run(&cli.file)?;

    let stdout = stdout();
    let formatter = ReportFormatter::new(cli.output).with_color(stdout.is_terminal());
    let mut out = stdout.lock();
    formatter.write_outcome(&mut out, &outcome)?;
    out.flush().map_err(|e| ReportError::Output(e.to_string()))
}

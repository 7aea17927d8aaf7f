use apache_report::cli::Cli;
use apache_report::commands::run_report;
use apache_report::error::exit_code;
use apache_report::logging::init_logging;
use clap::error::ErrorKind;
use clap::Parser;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_code::OK,
                _ => exit_code::USAGE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(&cli.log_level);

    if let Err(e) = run_report(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

use std::io;
use std::process::ExitCode;

use clap::Parser;

use lpm::cli::Cli;
use lpm::diagnostics;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = err.exit_code();
            let _ = err.print();
            return ExitCode::from(u8::try_from(code).unwrap_or(lpm::EXIT_USAGE));
        }
    };
    let config = cli.into_config();
    diagnostics::init_logging(config.mode);

    let stdin = io::stdin();
    let stdout = io::stdout();
    match lpm::run(&config, stdin.lock(), stdout.lock(), io::stderr()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lpm: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

use clap::Parser;
use kline_signals::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

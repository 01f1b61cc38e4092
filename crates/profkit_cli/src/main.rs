use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::{Env, Target};

#[derive(Parser)]
#[command(name = "profkit-xlsx")]
#[command(
    about = "Convert coverage-toolchain profile JSON files into one XLSX workbook",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Output workbook
    #[arg(short, long, default_value = "stats.xlsx", value_hint = clap::ValueHint::FilePath)]
    output: PathBuf,

    /// Profile JSON files, one worksheet each, in this order
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stdout; RUST_LOG overrides the level.
    let env = Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env)
        .target(Target::Stdout)
        .format_timestamp(None)
        .init();

    match profkit_xlsx::build(&cli.output, &cli.files) {
        Ok(report) => {
            log::info!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

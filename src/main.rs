//! terracheck CLI — terraform init, validate and plan without apply.

use clap::Parser;
use terracheck::logging::{self, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "terracheck",
    version,
    about = "Terraform init/validate/plan driver for tests and CI — no apply, no destroy"
)]
struct Cli {
    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: terracheck::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = terracheck::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

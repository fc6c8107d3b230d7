//! slnbake CLI application
//!
//! Bootstraps NuGet and MSBuild for the solution in the working directory,
//! then runs the requested target.

// CLI binary needs to output to stderr before tracing is available
#![allow(clippy::print_stderr)]

use clap::Parser;
use slnbake::cli::{Cli, EXIT_CLI, EXIT_OK, exit_code_for, render_error};
use slnbake::tracing::{self, TracingConfig};

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
    };
    if let Err(e) = tracing::init_tracing(tracing_config) {
        eprintln!("{e:?}");
        std::process::exit(EXIT_CLI);
    }

    std::process::exit(run_with_tokio(&cli));
}

/// Run on a current-thread runtime; every step is awaited in sequence.
fn run_with_tokio(cli: &Cli) -> i32 {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            return 1;
        }
    };

    match rt.block_on(slnbake::run(cli)) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, cli.json_mode());
            exit_code_for(&err)
        }
    }
}

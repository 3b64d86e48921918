//! Sitewright CLI.
//!
//! Usage:
//!   sitewright worker                 Run one protocol request from stdin
//!   sitewright scaffold <dir>         Scaffold site files into a directory

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitewright::output;
use sitewright::process::run_worker;
use sitewright::site::{Installation, jobs};

#[derive(Parser)]
#[command(name = "sitewright")]
#[command(about = "Site fixture installer with out-of-process lifecycle operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one worker request: read the payload from standard input, apply
    /// its control, execute its job and exit with the job's outcome.
    Worker,

    /// Scaffold baseline site files into a directory.
    Scaffold {
        /// Target root directory
        dir: PathBuf,

        /// Site version tag to scaffold
        #[arg(long, default_value = "latest")]
        version: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Worker => {
            let code = run_worker(locked_stdin(), &jobs::registry());
            ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
        }
        Commands::Scaffold { dir, version } => match scaffold(&dir, &version) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                output::error(&format!("{err:#}"));
                ExitCode::FAILURE
            }
        },
    }
}

fn locked_stdin() -> impl Read {
    std::io::stdin().lock()
}

fn scaffold(dir: &PathBuf, version: &str) -> anyhow::Result<()> {
    output::action(&format!("Scaffolding {}", dir.display()));
    let installation = Installation::scaffold(dir, version)
        .with_context(|| format!("failed to scaffold {}", dir.display()))?;

    if let Some(site_version) = installation.version() {
        output::detail(&format!("version {}", site_version.version));
    }
    output::success(&format!("{} scaffolded", dir.display()));
    Ok(())
}

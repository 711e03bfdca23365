//! Meshpack - convert 3D model files into a flat binary mesh format
//!
//! This is the command-line entry point.

mod cli;
mod convert;
mod report;
mod settings;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{CliArgs, Command, USAGE};
use settings::ConvertSettings;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &CliArgs) -> Result<()> {
    match cli.command() {
        Command::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        Command::Incomplete(missing) => {
            for line in missing {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Inspect(path) => {
            let settings = ConvertSettings::resolve(cli)?;
            convert::inspect(&path, settings.report.format, &mut io::stdout().lock())
        }
        Command::Convert { source, out } => {
            let settings = ConvertSettings::resolve(cli)?;
            info!("Converting {} -> {}", source.display(), out.display());
            let summary = convert::convert(&source, &out, &settings, &mut io::stdout().lock())?;
            info!(
                "Done: {} meshes, {} vertices, {} indices",
                summary.mesh_count, summary.vertex_count, summary.index_count
            );
            Ok(())
        }
    }
}

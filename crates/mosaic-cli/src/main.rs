//! CLI entrypoint for mosaic.

mod cli;
mod commands;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mosaic_core::config::{EngineConfig, CONFIG_FILE_NAME};
use tracing_subscriber::filter::Directive;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose)?;
    let registry = commands::registry(&config)?;
    match cli.command {
        Command::Kinds => {
            commands::kinds(&registry);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { layout } => commands::check(&config, &registry, layout),
        Command::Frame { layout, at } => {
            commands::frame(&config, &registry, layout, at.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { layout, frames } => {
            commands::run(&config, &registry, layout, frames)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = explicit {
        return EngineConfig::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let local = Path::new(CONFIG_FILE_NAME);
    if local.is_file() {
        return EngineConfig::load(local).with_context(|| format!("loading {CONFIG_FILE_NAME}"));
    }
    Ok(EngineConfig::default())
}

fn init_logging(config: &EngineConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { "debug" } else { config.log_level.as_str() };
    let directive: Directive = level
        .parse()
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

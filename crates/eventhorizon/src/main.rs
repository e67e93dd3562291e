//! Entry point wiring that stitches together the CLI surface, filesystem bootstrap and
//! the windowed run path, while exposing utility commands like `eventhorizon probe`
//! and `eventhorizon config where`.
//!
//! Functions:
//!
//! - `main` parses CLI input, initialises tracing, and dispatches to modes.
//! - `handle_config_command` and `handle_probe_command` back the subcommands.

mod audio;
mod bootstrap;
mod cli;
mod diagnostics;
mod paths;
mod run;

use anyhow::{bail, Context, Result};
use cli::{Command, ConfigAction, ProbeCommand};
use paths::AppPaths;
use renderer::{probe, WgpuProvider};
use sceneconfig::SceneConfig;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Probe(probe_cmd)) => handle_probe_command(&probe_cmd),
        Some(Command::Config(config_cmd)) => {
            handle_config_command(config_cmd.action, cli.run.config.as_deref())
        }
        None => run::run(cli.run),
    }
}

fn handle_probe_command(command: &ProbeCommand) -> Result<()> {
    let report = probe(&WgpuProvider);
    if command.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialise probe report")?;
        println!("{json}");
    } else {
        println!("{report}");
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, explicit: Option<&std::path::Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_path = explicit
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());

    match action {
        ConfigAction::Where => {
            println!("Configuration:");
            println!("  config dir: {}", paths.config_dir().display());
            println!("  data dir:   {}", paths.data_dir().display());
            println!(
                "  config:     {} ({})",
                config_path.display(),
                if config_path.exists() {
                    "present"
                } else {
                    "missing, using defaults"
                }
            );
            println!("  audio:      {}", paths.default_track().display());
            Ok(())
        }
        ConfigAction::Dump => {
            let config = SceneConfig::load_or_default(&config_path)
                .with_context(|| format!("failed to load {}", config_path.display()))?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    config_path.display()
                );
            }
            bootstrap::write_default_config(&config_path)?;
            println!("wrote {}", config_path.display());
            Ok(())
        }
    }
}

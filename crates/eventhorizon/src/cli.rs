use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderer::{Antialiasing, ColorSpaceMode};
use sceneconfig::ColorSpaceSetting;

#[derive(Parser, Debug)]
#[command(
    name = "eventhorizon",
    author,
    version,
    about = "Real-time black hole visualization",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Scene configuration file (defaults to `<config dir>/eventhorizon.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap (0 = uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Looping audio track to play once audio is unlocked.
    #[arg(long, value_name = "PATH")]
    pub audio: Option<PathBuf>,

    /// Disable the ambient audio entirely.
    #[arg(long)]
    pub mute: bool,

    /// Seed for the starfield scatter.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Advance the animation by a fixed step per frame (`16`, `16ms`, `1s`).
    #[arg(long, value_name = "MS", value_parser = parse_step)]
    pub fixed_step: Option<Duration>,

    /// Disable the slow camera drift.
    #[arg(long)]
    pub no_drift: bool,

    /// Uniform scale of the black hole group.
    #[arg(long, value_name = "N")]
    pub scale: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a GPU context can be created and print what was found.
    Probe(ProbeCommand),
    /// Inspect or create the scene configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print resolved directories and the config file location.
    Where,
    /// Print the effective configuration as TOML.
    Dump,
    /// Write a configuration file populated with the defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// Shares the keyword set of the `[render] antialias` key.
pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    if value.trim().is_empty() {
        return Err("--antialias needs a value".to_string());
    }
    sceneconfig::parse_antialias(value).map(Antialiasing::from)
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let setting = match value.trim().to_ascii_lowercase().as_str() {
        "auto" => ColorSpaceSetting::Auto,
        "gamma" => ColorSpaceSetting::Gamma,
        "linear" => ColorSpaceSetting::Linear,
        _ => return Err(format!("unknown color space '{value}', expected auto, gamma or linear")),
    };
    Ok(setting.into())
}

/// Bare numbers are milliseconds; anything else goes through humantime.
pub fn parse_step(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    let step = match trimmed.parse::<u64>() {
        Ok(millis) => Duration::from_millis(millis),
        Err(_) => humantime::parse_duration(trimmed)
            .map_err(|err| format!("invalid step '{trimmed}': {err}"))?,
    };
    if step.is_zero() {
        return Err("fixed step must be greater than zero".to_string());
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_modes() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("OFF").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_steps_as_millis_or_humantime() {
        assert_eq!(parse_step("16").unwrap(), Duration::from_millis(16));
        assert_eq!(parse_step("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_step("1s").unwrap(), Duration::from_secs(1));
        assert!(parse_step("0").is_err());
        assert!(parse_step("soon").is_err());
    }

    #[test]
    fn run_flags_parse_alongside_subcommands() {
        let cli = Cli::try_parse_from([
            "eventhorizon",
            "--size",
            "800x600",
            "--no-drift",
            "--mute",
            "--color-space",
            "linear",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.size.as_deref(), Some("800x600"));
        assert!(cli.run.no_drift && cli.run.mute);
        assert_eq!(cli.run.color_space, Some(ColorSpaceMode::Linear));

        let cli = Cli::try_parse_from(["eventhorizon", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Init { force: true }
            }))
        ));
    }
}

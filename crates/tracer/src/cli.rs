use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use renderconfig::Resolution;

#[derive(Parser, Debug)]
#[command(
    name = "tracer",
    author,
    version,
    about = "Progressive GPU path tracer",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Settings file; defaults to `<config dir>/tracer/config.toml` when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image size in pixels (e.g. `1280x720`).
    #[arg(
        long,
        value_name = "WIDTHxHEIGHT",
        value_parser = parse_size,
        conflicts_with = "resolution"
    )]
    pub size: Option<(u32, u32)>,

    /// 16:9 preset: `2160p`, `1440p`, `1080p`, `720p` or `360p`.
    #[arg(long, value_name = "PRESET", value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Samples per pixel to accumulate.
    #[arg(long, value_name = "N")]
    pub samples: Option<u32>,

    /// Samples each compute pass adds per pixel.
    #[arg(long, value_name = "N")]
    pub samples_per_pass: Option<u32>,

    /// Maximum bounces per path.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<u32>,

    /// Seed for the random sphere scene.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Save the final frame as PNG.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Cancel the run once this much time has passed (e.g. `30s`, `2m`).
    #[arg(long, value_name = "DURATION", value_parser = parse_time_limit)]
    pub time_limit: Option<Duration>,

    /// Skip waiting on the device after each pass; pass times then only cover submission.
    #[arg(long)]
    pub no_timing: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Replace the built-in compute shader with a WGSL file (entry point `main`).
    #[arg(long, value_name = "WGSL")]
    pub compute_shader: Option<PathBuf>,

    /// Replace the built-in display shader with a WGSL file (`vs_main`/`fs_main`).
    #[arg(long, value_name = "WGSL")]
    pub display_shader: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an image (the default when no subcommand is given).
    Render(RunArgs),
    /// Print the resolved settings as TOML without touching the GPU.
    Config(RunArgs),
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{trimmed}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be positive, got {width}x{height}"));
    }
    Ok((width, height))
}

pub fn parse_resolution(value: &str) -> Result<Resolution, String> {
    value.parse()
}

pub fn parse_time_limit(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }
    humantime::parse_duration(trimmed).map_err(|err| format!("invalid duration '{trimmed}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 64X36 ").unwrap(), (64, 36));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn parses_time_limits() {
        assert_eq!(parse_time_limit("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_time_limit("2m").unwrap(), Duration::from_secs(120));
        assert!(parse_time_limit("soon").is_err());
    }

    #[test]
    fn subcommand_and_flags() {
        let cli = Cli::try_parse_from(["tracer", "config", "--samples", "7"]).unwrap();
        match cli.command {
            Some(Command::Config(args)) => assert_eq!(args.samples, Some(7)),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["tracer", "--size", "64x36", "--json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.size, Some((64, 36)));
        assert!(cli.run.json);

        let conflicting =
            Cli::try_parse_from(["tracer", "--size", "64x36", "--resolution", "720p"]);
        assert!(conflicting.is_err());
    }
}

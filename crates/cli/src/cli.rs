//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Ride Analyzer - offline motion classification for phone IMU/GPS recordings
#[derive(Parser, Debug)]
#[command(
    name = "ride-analyzer",
    author,
    version,
    about = "Offline IMU/GPS ride analysis",
    long_about = "Classifies recorded phone sensor frames into motion states.\n\n\
                  Windowed mode produces per-window decisions, smoothed segments and \n\
                  impact events; single-pass mode produces stream statistics, \n\
                  features and quality flags for the whole recording."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RIDE_ANALYZER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RIDE_ANALYZER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default filter directive when RUST_LOG is unset
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one or more frame files
    Analyze(AnalyzeArgs),

    /// Validate an analysis configuration file
    Validate(ValidateArgs),

    /// Display the effective analysis configuration
    Info(InfoArgs),

    /// Write a synthetic reference ride
    Simulate(SimulateArgs),
}

/// Arguments for the `analyze` command
#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Frame files (.json array or .jsonl/.ndjson lines)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Analysis configuration (TOML or JSON); defaults when omitted
    #[arg(short, long, env = "RIDE_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analysis mode
    #[arg(long, value_enum, default_value = "windowed", env = "RIDE_ANALYZER_MODE")]
    pub mode: AnalysisMode,

    /// Write results here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Device capabilities report (JSON), used in single-pass mode
    #[arg(long)]
    pub capabilities: Option<PathBuf>,

    /// Print an aggregate summary over all files
    #[arg(long)]
    pub summary: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RIDE_ANALYZER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "ride.toml", env = "RIDE_ANALYZER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, env = "RIDE_ANALYZER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Destination frame file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Frame layout; detected from the output extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<FrameFileFormat>,

    /// Also write the matching capabilities report here
    #[arg(long)]
    pub capabilities: Option<PathBuf>,
}

/// Analysis mode
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Sliding windows, segments and events
    #[default]
    Windowed,
    /// Whole-recording statistics and flags
    SinglePass,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Windowed => "windowed",
            AnalysisMode::SinglePass => "single-pass",
        }
    }
}

/// Frame file layout
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FrameFileFormat {
    /// JSON array
    Json,
    /// One frame per line
    Jsonl,
}

impl From<FrameFileFormat> for ingestion::FrameFormat {
    fn from(format: FrameFileFormat) -> Self {
        match format {
            FrameFileFormat::Json => ingestion::FrameFormat::Json,
            FrameFileFormat::Jsonl => ingestion::FrameFormat::JsonLines,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::parse_from([
            "ride-analyzer",
            "-v",
            "analyze",
            "a.json",
            "b.jsonl",
            "--mode",
            "single-pass",
            "--summary",
        ]);
        assert_eq!(cli.log_level(), "debug");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.mode, AnalysisMode::SinglePass);
        assert!(args.summary);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_analyze_requires_files() {
        assert!(Cli::try_parse_from(["ride-analyzer", "analyze"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["ride-analyzer", "-q", "-v", "info"]).is_err());
        let cli = Cli::parse_from(["ride-analyzer", "-q", "info"]);
        assert_eq!(cli.log_level(), "error");
    }
}

//! CLI argument definitions for linestat.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Extract fields from log lines and emit them as StatsD metrics.
///
/// Lines are read from stdin unless `--file` is given. Every configured
/// parser is applied to every line; matches are routed to processors.
#[derive(Parser, Debug)]
#[command(name = "linestat")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to the configuration file (TOML, or JSON with a `.json` extension).
    #[arg(short, long, default_value = "/etc/linestat/linestat.toml")]
    pub config: PathBuf,

    /// Read lines from this file instead of stdin.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Keep reading as the file grows, reopening it when truncated.
    #[arg(long, requires = "file")]
    pub follow: bool,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without reading any lines.
    #[arg(long)]
    pub validate: bool,

    /// List available parser and processor modules and exit.
    #[arg(long)]
    pub list_modules: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        DaemonCli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = DaemonCli::parse_from(["linestat"]);
        assert_eq!(cli.config, PathBuf::from("/etc/linestat/linestat.toml"));
        assert!(cli.file.is_none());
        assert!(!cli.follow);
        assert!(!cli.validate);
        assert!(!cli.list_modules);
    }

    #[test]
    fn follow_requires_file() {
        assert!(DaemonCli::try_parse_from(["linestat", "--follow"]).is_err());
        let cli = DaemonCli::parse_from(["linestat", "--file", "/var/log/x.log", "--follow"]);
        assert!(cli.follow);
    }
}

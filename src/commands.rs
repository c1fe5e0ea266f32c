//! Command-line definition
//!
//! Flags follow the classic npipe spelling: `-h` is the host, so help is
//! only available as `--help`, and `-v` prints the version while `-V`
//! turns on verbose mirroring.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "npipe",
    about = "Bridge a named pipe to a remote TCP service, one line at a time",
    version,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Remote host to connect to
    #[arg(short = 'h', long)]
    pub host: String,

    /// Remote port to connect to
    #[arg(short = 'p', long)]
    pub port: String,

    /// Fork into the background and print the daemon's pid
    #[arg(short = 'f', long = "fork")]
    pub daemonize: bool,

    /// Mirror relayed lines on stdout ("> " sent, "< " received)
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Configuration file (default: platform config dir, npipe/config.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Named pipe to read from (default: ./in)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// File receiving remote output (default: ./out)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_classic_flags() {
        let cli = Cli::try_parse_from(["npipe", "-h", "localhost", "-p", "7", "-f", "-V"]).unwrap();
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, "7");
        assert!(cli.daemonize);
        assert!(cli.verbose);
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_host_and_port_are_required() {
        assert!(Cli::try_parse_from(["npipe", "-h", "localhost"]).is_err());
        assert!(Cli::try_parse_from(["npipe", "-p", "7"]).is_err());
    }

    #[test]
    fn test_lowercase_v_is_version() {
        let err = Cli::try_parse_from(["npipe", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_path_overrides() {
        let cli = Cli::try_parse_from([
            "npipe", "-h", "::1", "-p", "80", "--input", "/tmp/x/in", "--output", "/tmp/x/out",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("/tmp/x/in")));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/x/out")));
    }
}

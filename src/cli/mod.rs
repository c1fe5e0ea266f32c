//! Invocation handling
//!
//! Resolves configuration, optionally detaches, then drives the bridge on a
//! single-threaded runtime until a fatal error or a termination signal.

use std::io;

use crate::bridge::{endpoint, Bridge};
use crate::commands::Cli;
use crate::common::{config::Config, logging, signal, Result};
use crate::daemon;

/// Resolve the effective configuration: file first, then command-line overrides
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(input) = &cli.input {
        config.bridge.input = input.clone();
    }
    if let Some(output) = &cli.output {
        config.bridge.output = output.clone();
    }
    config.validate()?;

    Ok(config)
}

/// Run npipe for a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    // Fork before the runtime or any logging thread exists
    let _log_guard = if cli.daemonize {
        daemon::daemonize()?;
        logging::init_detached(config.log.file.as_deref())
    } else {
        logging::init_foreground();
        None
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(serve(&cli, &config))
}

/// Connect, set up the bridge and relay until something ends it
async fn serve(cli: &Cli, config: &Config) -> Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        host = %cli.host,
        port = %cli.port,
        "Starting npipe"
    );

    let remote = endpoint::dial(&cli.host, &cli.port).await?;
    let echo = cli.verbose.then(io::stdout);
    let mut bridge = Bridge::open(remote, &config.bridge, echo).await?;

    tokio::select! {
        result = bridge.run() => result,
        signal = signal::shutdown_signal() => {
            let name = signal?;
            tracing::info!(
                signal = name,
                reopens = bridge.reopens(),
                pipe = %bridge.pipe_path().display(),
                "Shutting down"
            );
            Ok(())
        }
    }
}

/// Map a fatal error to the process exit status
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_cli_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[bridge]\ninput = \"from-file\"\noutput = \"file-out\"\nline_capacity = 64\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "npipe",
            "-h",
            "localhost",
            "-p",
            "7",
            "-c",
            path.to_str().unwrap(),
            "--input",
            "from-cli",
        ]);
        let config = resolve_config(&cli).unwrap();

        assert_eq!(config.bridge.input, PathBuf::from("from-cli"));
        assert_eq!(config.bridge.output, PathBuf::from("file-out"));
        assert_eq!(config.bridge.line_capacity, 64);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Ok(())), 0);
        assert_eq!(exit_code(&Err(Error::RemoteClosed)), 1);
    }
}

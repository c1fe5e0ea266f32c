//! npipe - bridge a named pipe to a remote TCP service
//!
//! Lines written to `./in` are sent to the remote host; lines the host sends
//! back are appended to `./out`.

use clap::Parser;
use npipe::{cli, commands::Cli};

fn main() {
    let args = Cli::parse();

    let result = cli::run(args);
    if let Err(e) = &result {
        eprintln!("error: {e}");
    }
    std::process::exit(cli::exit_code(&result));
}

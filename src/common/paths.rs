//! Filesystem locations used by npipe
//!
//! The named pipe and the output file live in the working directory under
//! fixed names. The optional configuration file lives in the platform config
//! directory.

use std::path::PathBuf;

/// Name used for the configuration directory
const APP_NAME: &str = "npipe";

/// Default path of the named pipe, relative to the working directory
pub const DEFAULT_INPUT: &str = "in";

/// Default path of the output file, relative to the working directory
pub const DEFAULT_OUTPUT: &str = "out";

/// Default named pipe path (`./in`)
pub fn default_input() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT)
}

/// Default output file path (`./out`)
pub fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/npipe/`
/// - macOS: `~/Library/Application Support/npipe/`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_relative() {
        assert!(default_input().is_relative());
        assert!(default_output().is_relative());
        assert_eq!(default_input(), PathBuf::from("in"));
        assert_eq!(default_output(), PathBuf::from("out"));
    }

    #[test]
    fn test_config_path_ends_with_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with("npipe/config.toml"));
        }
    }
}

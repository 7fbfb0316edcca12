//! Typed error hierarchy for forge-ci.
//!
//! Two enums cover the two places things can go wrong:
//! - `ConfigError` — startup configuration failures (always fatal)
//! - `RunnerError` — a shell phase that did not succeed (recorded, never fatal)

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading settings or the project file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not access configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read configuration at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid project name '{name}': use letters, digits, '.', '_' or '-', starting with a letter or digit")]
    InvalidProjectName { name: String },

    #[error("Build secret must not be empty")]
    EmptySecret,
}

/// Why a shell phase failed.
///
/// The `Display` text is what ends up in a project's recorded error.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to create working directory {path}: {source}")]
    WorkingDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start shell '{shell}': {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for shell: {0}")]
    Wait(#[source] std::io::Error),

    #[error("exit status {code}")]
    NonZeroExit { code: i32 },

    #[error("terminated by signal")]
    Signalled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_read_carries_path() {
        let path = PathBuf::from("/etc/forge-ci/config.json");
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ConfigError::Read {
            path: path.clone(),
            source: io_err,
        };
        match &err {
            ConfigError::Read { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Read variant"),
        }
        assert!(err.to_string().contains("/etc/forge-ci/config.json"));
    }

    #[test]
    fn invalid_project_name_mentions_name() {
        let err = ConfigError::InvalidProjectName {
            name: "../etc".into(),
        };
        assert!(err.to_string().contains("'../etc'"));
    }

    #[test]
    fn non_zero_exit_reads_like_an_exit_status() {
        let err = RunnerError::NonZeroExit { code: 2 };
        assert_eq!(err.to_string(), "exit status 2");
    }

    #[test]
    fn spawn_failure_names_the_shell() {
        let err = RunnerError::Spawn {
            shell: "no-such-shell".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("no-such-shell"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ConfigError::EmptySecret);
        assert_std_error(&RunnerError::Signalled);
    }
}

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::RunnerError;

/// Captured result of one shell phase.
#[derive(Debug)]
pub struct ScriptOutcome {
    /// Stdout and stderr, interleaved as the script wrote them.
    pub output: String,
    pub failure: Option<RunnerError>,
}

impl ScriptOutcome {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            failure: None,
        }
    }

    pub fn failed(output: impl Into<String>, failure: RunnerError) -> Self {
        Self {
            output: output.into(),
            failure: Some(failure),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Text form of the failure, as stored on the project record.
    pub fn error_text(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Abstraction over script execution for testability.
/// Real implementation: `ShellRunner`. Test double: `ScriptedRunner` in the
/// orchestrator tests.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, working_dir: &Path, script: &str) -> ScriptOutcome;
}

/// Runs scripts with `<shell> -c`, in a fresh process each time.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("bash")
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, working_dir: &Path, script: &str) -> ScriptOutcome {
        // Point stderr at stdout inside the shell so both land in one pipe in
        // the order they were written.
        let body = format!("exec 2>&1\n{}", script);

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(&body)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(source) => {
                return ScriptOutcome::failed(
                    String::new(),
                    RunnerError::Spawn {
                        shell: self.shell.clone(),
                        source,
                    },
                );
            }
        };

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => return ScriptOutcome::failed(String::new(), RunnerError::Wait(e)),
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        // Anything here was written before the redirect took effect, e.g. a
        // shell that rejected its arguments.
        if !output.stderr.is_empty() {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        debug!(
            dir = %working_dir.display(),
            exit_code = ?output.status.code(),
            bytes = text.len(),
            "shell exited"
        );

        if output.status.success() {
            return ScriptOutcome::success(text);
        }
        let failure = match output.status.code() {
            Some(code) => RunnerError::NonZeroExit { code },
            None => RunnerError::Signalled,
        };
        ScriptOutcome::failed(text, failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh() -> ShellRunner {
        ShellRunner::new("sh")
    }

    #[tokio::test]
    async fn test_successful_script_captures_output() {
        let dir = TempDir::new().unwrap();
        let outcome = sh().run(dir.path(), "echo hello; echo world").await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.output, "hello\nworld\n");
        assert!(outcome.error_text().is_none());
    }

    #[tokio::test]
    async fn test_stderr_is_interleaved_with_stdout() {
        let dir = TempDir::new().unwrap();
        let outcome = sh()
            .run(dir.path(), "echo one; echo two >&2; echo three")
            .await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.output, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure_with_output() {
        let dir = TempDir::new().unwrap();
        let outcome = sh().run(dir.path(), "echo compiling\nexit 3").await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.output, "compiling\n");
        assert!(matches!(
            outcome.failure,
            Some(RunnerError::NonZeroExit { code: 3 })
        ));
        assert_eq!(outcome.error_text().as_deref(), Some("exit status 3"));
    }

    #[tokio::test]
    async fn test_chained_commands_use_last_exit_status() {
        let dir = TempDir::new().unwrap();
        let outcome = sh().run(dir.path(), "false; echo recovered").await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.output, "recovered\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = TempDir::new().unwrap();
        let outcome = sh().run(dir.path(), "touch marker").await;
        assert!(outcome.succeeded());
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_shell_is_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let runner = ShellRunner::new("/nonexistent/forge-ci-shell");
        let outcome = runner.run(dir.path(), "echo hi").await;
        assert!(outcome.output.is_empty());
        match outcome.failure {
            Some(RunnerError::Spawn { shell, .. }) => {
                assert_eq!(shell, "/nonexistent/forge-ci-shell")
            }
            other => panic!("Expected Spawn failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runs_do_not_share_state() {
        let dir = TempDir::new().unwrap();
        let runner = sh();
        runner.run(dir.path(), "FORGE_CI_TEST_VAR=bar; export FORGE_CI_TEST_VAR").await;
        let outcome = runner.run(dir.path(), "echo \"[$FORGE_CI_TEST_VAR]\"").await;
        assert_eq!(outcome.output, "[]\n");
    }

    #[test]
    fn test_default_shell_is_bash() {
        assert_eq!(ShellRunner::default().shell(), "bash");
    }
}

//! Process execution for adb command lines

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

use super::command::AdbCommand;
use crate::config::CONNECTION_CONFIG;
use crate::error::{AdbError, Result};

/// Output fragment `am start` prints once the activity manager accepted an intent
pub const INTENT_ACK_MARKER: &str = "Starting: Intent";

/// Runs adb command lines.
///
/// There is no timeout: a hung adb process blocks the caller until adb
/// itself gives up.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command and return its stdout.
    ///
    /// Fails with `CommandFailed` on a non-zero exit status and with
    /// `BridgeUnavailable` when the adb executable cannot be started.
    async fn output(&self, command: &AdbCommand) -> Result<String>;

    /// Run the command with the caller's terminal attached, returning when it exits
    async fn attach(&self, command: &AdbCommand) -> Result<()>;
}

/// Runs commands by spawning the adb executable
#[derive(Debug, Clone)]
pub struct SystemRunner {
    adb_path: String,
}

impl SystemRunner {
    /// Runner using the configured adb path (`ADB_CONNECTOR_ADB_PATH` or `adb`)
    pub fn new() -> Self {
        Self {
            adb_path: CONNECTION_CONFIG.adb_path.clone(),
        }
    }

    /// Runner using a custom adb path
    pub fn with_path(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    pub fn adb_path(&self) -> &str {
        &self.adb_path
    }

    fn command(&self, command: &AdbCommand) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        cmd.args(command.args());
        cmd
    }

    fn spawn_error(&self, err: std::io::Error) -> AdbError {
        if err.kind() == ErrorKind::NotFound {
            AdbError::BridgeUnavailable(format!("'{}' not found in PATH", self.adb_path))
        } else {
            AdbError::Io(err)
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn output(&self, command: &AdbCommand) -> Result<String> {
        debug!("Running: {}", command);

        let output = self
            .command(command)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("'{}' exited with {}", command, output.status)
            } else {
                format!("'{}': {}", command, stderr.trim())
            };
            return Err(AdbError::CommandFailed(reason));
        }

        Ok(String::from_utf8(output.stdout)?)
    }

    async fn attach(&self, command: &AdbCommand) -> Result<()> {
        debug!("Attaching: {}", command);

        let status = self
            .command(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if status.success() {
            Ok(())
        } else {
            Err(AdbError::CommandFailed(format!(
                "'{}' exited with {}",
                command, status
            )))
        }
    }
}

/// Issues commands and interprets their output.
///
/// `run_confirmed` and `run_intent` read success from the shape of adb's
/// output only. They are best-effort signals: adb can report nothing (or an
/// acknowledged intent) while the device-side effect never happens.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
}

impl Executor {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run and return the captured output text
    pub async fn run(&self, command: &AdbCommand) -> Result<String> {
        self.runner.output(command).await
    }

    /// Run a fire-and-confirm command: success only when adb printed nothing
    pub async fn run_confirmed(&self, command: &AdbCommand) -> Result<bool> {
        let output = self.runner.output(command).await?;
        if !output.is_empty() {
            debug!("'{}' returned output: {}", command, output.trim());
        }
        Ok(output.is_empty())
    }

    /// Run an intent launch: success only when the acknowledgment marker is present
    pub async fn run_intent(&self, command: &AdbCommand) -> Result<bool> {
        let output = self.runner.output(command).await?;
        let acknowledged = output.contains(INTENT_ACK_MARKER);
        if !acknowledged {
            debug!("Intent not acknowledged by '{}': {}", command, output.trim());
        }
        Ok(acknowledged)
    }

    /// Run with the terminal attached
    pub async fn attach(&self, command: &AdbCommand) -> Result<()> {
        self.runner.attach(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;

    #[tokio::test]
    async fn test_run_confirmed_requires_empty_output() {
        let mock = MockRunner::new()
            .on("adb -s A shell input keyevent 3", "")
            .on("adb -s A shell input keyevent 4", "Error: unknown\n");
        let executor = Executor::new(Arc::new(mock));

        assert!(executor
            .run_confirmed(&AdbCommand::keyevent("A", 3))
            .await
            .unwrap());
        assert!(!executor
            .run_confirmed(&AdbCommand::keyevent("A", 4))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_run_intent_checks_marker() {
        let mock = MockRunner::new()
            .on(
                "adb -s A shell am start -a android.intent.action.CALL -d tel:'1'",
                "Starting: Intent { act=android.intent.action.CALL dat=tel:xxx }\n",
            )
            .on(
                "adb -s A shell am start -a android.intent.action.CALL -d tel:'2'",
                "Error: Activity not started, unable to resolve Intent\n",
            );
        let executor = Executor::new(Arc::new(mock));

        assert!(executor
            .run_intent(&AdbCommand::call_intent("A", "1"))
            .await
            .unwrap());
        assert!(!executor
            .run_intent(&AdbCommand::call_intent("A", "2"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let mock = MockRunner::new().fail("adb -s A shell getprop", "device offline");
        let executor = Executor::new(Arc::new(mock));

        let err = executor.run(&AdbCommand::getprop("A")).await.unwrap_err();
        assert!(err.is_execution_error());
    }

    #[tokio::test]
    async fn test_missing_executable_is_bridge_unavailable() {
        let runner = SystemRunner::with_path("/nonexistent/adb-connector-test-adb");
        let err = runner.output(&AdbCommand::devices()).await.unwrap_err();
        assert!(matches!(err, AdbError::BridgeUnavailable(_)));
    }
}

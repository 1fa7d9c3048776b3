//! Scripted command runner for deterministic testing.
//!
//! Answers adb command lines from pre-configured responses without spawning
//! any process, and records every command it receives.
//!
//! # Example
//! ```
//! use adb_connector::mock::MockRunner;
//! let mock = MockRunner::new()
//!     .on("adb devices", "List of devices attached\nABC123\tdevice\n\n")
//!     .on("adb -s ABC123 shell input keyevent 3", "");
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::adb::{AdbCommand, CommandRunner};
use crate::error::{AdbError, Result};

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct MockState {
    replies: HashMap<String, VecDeque<Reply>>,
    commands: Vec<String>,
}

/// A command runner that returns pre-configured output.
///
/// Replies are matched on the full rendered command line. A command with
/// several queued replies consumes them in order and keeps repeating the
/// last one. Unknown commands succeed with empty output, which is what adb
/// prints for most input commands.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(self, command: &str, reply: Reply) -> Self {
        self.lock()
            .replies
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue output for a command line
    pub fn on(self, command: &str, output: &str) -> Self {
        self.push(command, Reply::Output(output.to_string()))
    }

    /// Queue several outputs for the same command line, consumed in order
    pub fn on_sequence(self, command: &str, outputs: &[&str]) -> Self {
        outputs
            .iter()
            .fold(self, |mock, output| mock.on(command, output))
    }

    /// Make a command line fail as if adb exited non-zero
    pub fn fail(self, command: &str, reason: &str) -> Self {
        self.push(command, Reply::Failure(reason.to_string()))
    }

    /// Every command line received so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// How many times a command line was received
    pub fn count(&self, command: &str) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    /// Received commands other than device listings
    pub fn device_commands(&self) -> Vec<String> {
        let listing = AdbCommand::devices().to_string();
        self.lock()
            .commands
            .iter()
            .filter(|c| **c != listing)
            .cloned()
            .collect()
    }

    fn reply(&self, command: &AdbCommand) -> Reply {
        let line = command.to_string();
        let mut state = self.lock();
        state.commands.push(line.clone());
        match state.replies.get_mut(&line) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Reply::Output(String::new())),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::Output(String::new())),
            None => Reply::Output(String::new()),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn output(&self, command: &AdbCommand) -> Result<String> {
        match self.reply(command) {
            Reply::Output(text) => Ok(text),
            Reply::Failure(reason) => Err(AdbError::CommandFailed(reason)),
        }
    }

    async fn attach(&self, command: &AdbCommand) -> Result<()> {
        match self.reply(command) {
            Reply::Output(_) => Ok(()),
            Reply::Failure(reason) => Err(AdbError::CommandFailed(reason)),
        }
    }
}

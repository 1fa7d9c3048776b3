//! Device discovery and adb server management

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use super::command::AdbCommand;
use super::executor::Executor;
use crate::error::{AdbError, Result};

const DEVICES_HEADER: &str = "List of devices attached";

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"Android Debug Bridge version\s+(\S+)").unwrap();
    static ref INSTALLED_RE: Regex = Regex::new(r"(?m)^Installed as\s+(.+?)\s*$").unwrap();
}

/// Connection status reported by `adb devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    Device,
    Unauthorized,
    Offline,
    Other(String),
}

impl DeviceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceStatus::Device => "device",
            DeviceStatus::Unauthorized => "unauthorized",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Other(s) => s,
        }
    }
}

impl From<&str> for DeviceStatus {
    fn from(s: &str) -> Self {
        match s {
            "device" => DeviceStatus::Device,
            "unauthorized" => DeviceStatus::Unauthorized,
            "offline" => DeviceStatus::Offline,
            other => DeviceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A device as listed by adb. Re-read on every query, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub id: String,
    pub status: DeviceStatus,
}

impl Device {
    pub fn new(id: impl Into<String>, status: impl Into<DeviceStatus>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
        }
    }
}

/// Host operating system family, which decides how `adb devices` output is split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Unix,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }

    pub fn parse_devices(self, output: &str) -> Result<Vec<Device>> {
        match self {
            HostPlatform::Windows => parse_devices_tokens(output),
            HostPlatform::Unix => parse_devices_lines(output),
        }
    }
}

/// Parse `adb devices` output as a whitespace token table.
///
/// Each row after the `attached` header is one device: the first token is the
/// id and the remaining tokens, single-spaced, are the status.
pub fn parse_devices_tokens(output: &str) -> Result<Vec<Device>> {
    let mut lines = output.lines();
    if !lines
        .by_ref()
        .any(|l| l.split_whitespace().any(|t| t == "attached"))
    {
        return Err(AdbError::ParseError(
            "no device list header in adb output".to_string(),
        ));
    }

    let mut devices = Vec::new();
    for line in lines {
        let mut tokens = line.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let status = tokens.collect::<Vec<_>>().join(" ");
        if status.is_empty() {
            return Err(AdbError::ParseError(format!(
                "device entry without status in adb output: {}",
                id
            )));
        }
        devices.push(Device::new(id, status.as_str()));
    }

    Ok(devices)
}

/// Parse `adb devices` output as tab-separated lines after the header line
pub fn parse_devices_lines(output: &str) -> Result<Vec<Device>> {
    let lines: Vec<&str> = output.lines().collect();
    // adb may print daemon start-up notices before the header
    let start = lines
        .iter()
        .position(|l| l.trim() == DEVICES_HEADER)
        .map(|i| i + 1)
        .unwrap_or(1);

    let mut devices = Vec::new();
    for line in lines.iter().skip(start) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut parts = line.split('\t');
        match (parts.next(), parts.next()) {
            (Some(id), Some(status)) => devices.push(Device::new(id.trim(), status.trim())),
            _ => {
                return Err(AdbError::ParseError(format!(
                    "malformed device line: {}",
                    line
                )))
            }
        }
    }

    Ok(devices)
}

/// Version details of the adb executable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdbInfo {
    pub version: String,
    pub executable: Option<String>,
}

/// Parse `adb --version` output
pub fn parse_adb_version(output: &str) -> Result<AdbInfo> {
    let version = VERSION_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AdbError::ParseError("no version in adb --version output".to_string()))?;

    let executable = INSTALLED_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    Ok(AdbInfo {
        version,
        executable,
    })
}

/// Lists attached devices and picks the default one
#[derive(Clone)]
pub struct DeviceRegistry {
    executor: Executor,
    platform: HostPlatform,
}

impl DeviceRegistry {
    pub fn new(executor: Executor, platform: HostPlatform) -> Self {
        Self { executor, platform }
    }

    /// List all attached devices in adb's order
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let output = self.executor.run(&AdbCommand::devices()).await?;
        self.platform.parse_devices(&output)
    }

    /// First listed device, or `None` when nothing is attached
    pub async fn first_available(&self) -> Result<Option<Device>> {
        Ok(self.list_devices().await?.into_iter().next())
    }

    /// Version of the adb executable
    pub async fn adb_info(&self) -> Result<AdbInfo> {
        let output = self.executor.run(&AdbCommand::version()).await?;
        parse_adb_version(&output)
    }

    /// Start the adb server
    pub async fn start_server(&self) -> Result<String> {
        self.executor.run(&AdbCommand::start_server()).await
    }

    /// Stop the adb server
    pub async fn kill_server(&self) -> Result<String> {
        self.executor.run(&AdbCommand::kill_server()).await
    }
}

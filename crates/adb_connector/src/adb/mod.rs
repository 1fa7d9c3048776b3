//! ADB (Android Debug Bridge) module
//!
//! This module provides:
//! - `command`: The adb command lines, reproduced exactly
//! - `executor`: Process execution and output-based success checks
//! - `connection`: Device listing and adb server management
//! - `state`: Device state parsed from diagnostic dumps

mod command;
mod connection;
mod executor;
mod state;

pub use command::{AdbCommand, CameraFacing, CaptureMode};
pub use connection::{
    parse_adb_version, parse_devices_lines, parse_devices_tokens, AdbInfo, Device, DeviceRegistry,
    DeviceStatus, HostPlatform,
};
pub use executor::{CommandRunner, Executor, SystemRunner, INTENT_ACK_MARKER};
pub use state::{
    parse_battery, parse_display_state, parse_packages, parse_property, BatteryInfo, DeviceState,
    PackageList, PhoneProfile, StateInspector,
};

//! adb_connector: Android device automation over the adb bridge
//!
//! This library drives a connected Android device by issuing adb command
//! lines and reading device state back out of adb's diagnostic dumps:
//! - Device discovery and selection of a default device
//! - Lock and screen-power state inferred from `dumpsys` output
//! - Key-event, gesture and intent actions guarded by state preconditions
//! - Composite sequences: unlock, photo and video capture, timed tap sequences
//!
//! # Example
//!
//! ```no_run
//! use adb_connector::{CaptureOptions, Connector};
//!
//! #[tokio::main]
//! async fn main() -> adb_connector::Result<()> {
//!     let connector = Connector::new();
//!
//!     let unlocked = connector.unlock_screen(Some("1234")).await?;
//!     if unlocked.success {
//!         connector.home().await?;
//!         connector
//!             .take_picture(CaptureOptions::new().with_zoom_in(2))
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Device bridge
pub mod adb;

// Core functionality
pub mod actions;

// Test support
pub mod mock;

// Re-export commonly used types and functions
pub use error::{AdbError, Result};

// Config re-exports
pub use config::{
    list_navigation_actions, list_supported_apps, ConnectionConfig, SequenceTimingConfig,
    TIMING_CONFIG,
};

// ADB re-exports
pub use adb::{
    AdbCommand, AdbInfo, BatteryInfo, CameraFacing, CaptureMode, CommandRunner, Device,
    DeviceState, DeviceStatus, HostPlatform, PackageList, PhoneProfile, SystemRunner,
};

// Actions re-exports
pub use actions::{
    ActionResult, CaptureOptions, Confidence, Connector, GestureSequence, GestureStep,
    SequenceReport,
};

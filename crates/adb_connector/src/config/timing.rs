//! Timing configuration for composite device sequences

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

fn env_seconds(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &f64| Duration::try_from_secs_f64(*v).is_ok())
        .unwrap_or(default)
}

/// Negative or NaN delays mean no wait; oversized ones saturate
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

/// Delays inserted between the steps of unlock and capture sequences.
///
/// All values are seconds. They exist to let the physical device and its UI
/// catch up, and are never cancelled once started.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceTimingConfig {
    /// Wait after waking the screen and between unlock steps
    pub settle_delay: f64,
    /// Wait before each zoom key event
    pub zoom_step_delay: f64,
    /// Wait before each shutter confirmation key event
    pub shutter_delay: f64,
    /// Length of one countdown tick (video duration, reboot countdown)
    pub countdown_tick: f64,
}

impl SequenceTimingConfig {
    pub fn settle(&self) -> Duration {
        seconds(self.settle_delay)
    }

    pub fn zoom_step(&self) -> Duration {
        seconds(self.zoom_step_delay)
    }

    pub fn shutter(&self) -> Duration {
        seconds(self.shutter_delay)
    }

    pub fn tick(&self) -> Duration {
        seconds(self.countdown_tick)
    }
}

impl Default for SequenceTimingConfig {
    fn default() -> Self {
        Self {
            settle_delay: env_seconds("ADB_CONNECTOR_SETTLE_DELAY", 0.5),
            zoom_step_delay: env_seconds("ADB_CONNECTOR_ZOOM_STEP_DELAY", 0.5),
            shutter_delay: env_seconds("ADB_CONNECTOR_SHUTTER_DELAY", 1.0),
            countdown_tick: env_seconds("ADB_CONNECTOR_COUNTDOWN_TICK", 1.0),
        }
    }
}

/// Location of the adb executable
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub adb_path: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            adb_path: env::var("ADB_CONNECTOR_ADB_PATH").unwrap_or_else(|_| "adb".to_string()),
        }
    }
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: SequenceTimingConfig = SequenceTimingConfig::default();

    /// Global connection configuration instance
    pub static ref CONNECTION_CONFIG: ConnectionConfig = ConnectionConfig::default();
}

//! Configuration module for adb_connector
//!
//! This module contains:
//! - `keycodes`: Key-event codes plus the app and navigation lookups
//! - `timing`: Delays used by composite sequences and the adb location

mod keycodes;
mod timing;

pub use keycodes::{
    get_app_keycode, get_navigation_keycode, list_navigation_actions, list_supported_apps,
    KEYCODE_BRIGHTNESS_DOWN, KEYCODE_BRIGHTNESS_UP, KEYCODE_ENTER, KEYCODE_POWER,
    KEYCODE_SCREENSHOT, KEYCODE_TAB, KEYCODE_VOICE_ASSIST, KEYCODE_VOLUME_DOWN,
    KEYCODE_VOLUME_UP, KEYCODE_ZOOM_IN, KEYCODE_ZOOM_OUT, NAVIGATION_ACTIONS, SUPPORTED_APPS,
};
pub use timing::{ConnectionConfig, SequenceTimingConfig, CONNECTION_CONFIG, TIMING_CONFIG};

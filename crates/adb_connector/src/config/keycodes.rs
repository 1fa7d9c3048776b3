//! Android key-event codes and the static name lookups built on them

use phf::phf_ordered_map;

pub const KEYCODE_SCREENSHOT: u16 = 120;
pub const KEYCODE_POWER: u16 = 26;
pub const KEYCODE_TAB: u16 = 61;
pub const KEYCODE_ENTER: u16 = 66;
pub const KEYCODE_ZOOM_IN: u16 = 168;
pub const KEYCODE_ZOOM_OUT: u16 = 169;
pub const KEYCODE_VOLUME_UP: u16 = 24;
pub const KEYCODE_VOLUME_DOWN: u16 = 25;
pub const KEYCODE_BRIGHTNESS_UP: u16 = 221;
pub const KEYCODE_BRIGHTNESS_DOWN: u16 = 220;
pub const KEYCODE_VOICE_ASSIST: u16 = 118;

/// System apps reachable through a dedicated launcher key event
pub static SUPPORTED_APPS: phf::OrderedMap<&'static str, u16> = phf_ordered_map! {
    "call_log" => 207,
    "calendar" => 208,
    "music" => 209,
    "calculator" => 210,
    "email" => 65,
    "browser" => 84,
    "camera" => 259,
};

/// Navigation gestures expressed as key events
pub static NAVIGATION_ACTIONS: phf::OrderedMap<&'static str, u16> = phf_ordered_map! {
    "home" => 3,
    "back" => 4,
    "foreground" => 82,
    "notification_center" => 83,
};

/// Look up the launcher key code for an app name (case-insensitive)
pub fn get_app_keycode(app_name: &str) -> Option<u16> {
    SUPPORTED_APPS.get(app_name.to_lowercase().as_str()).copied()
}

/// Look up the key code for a navigation action (case-insensitive)
pub fn get_navigation_keycode(action: &str) -> Option<u16> {
    NAVIGATION_ACTIONS.get(action.to_lowercase().as_str()).copied()
}

/// Names accepted by `open_app`, in declaration order
pub fn list_supported_apps() -> Vec<&'static str> {
    SUPPORTED_APPS.keys().copied().collect()
}

/// Names accepted by `navigate`, in declaration order
pub fn list_navigation_actions() -> Vec<&'static str> {
    NAVIGATION_ACTIONS.keys().copied().collect()
}

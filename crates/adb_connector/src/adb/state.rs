//! Device state inferred from diagnostic dumps

use serde::Serialize;
use tracing::debug;

use super::command::AdbCommand;
use super::executor::Executor;
use crate::error::{AdbError, Result};

const LOCKED_MARKER: &str = "mDreamingLockscreen=true";
const AWAKE_MARKER: &str = "screenState=SCREEN_STATE_ON";

const PROP_BRAND: &str = "[ro.product.brand]:";
const PROP_MODEL: &str = "[ro.product.model]:";
const PROP_VERSION: &str = "[ro.build.version.release]:";

/// Lock and screen-power state of a device.
///
/// Derived from one window dump. The physical device can change state
/// right after the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    pub is_locked: bool,
    pub is_awake: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatteryInfo {
    pub level: u8,
    pub is_charging: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageList {
    pub list: Vec<String>,
    pub count: usize,
}

impl PackageList {
    pub fn new(list: Vec<String>) -> Self {
        let count = list.len();
        Self { list, count }
    }
}

/// Identity, battery, screen state and installed packages of a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneProfile {
    pub brand: String,
    pub model: String,
    pub android_version: String,
    pub battery: BatteryInfo,
    pub state: DeviceState,
    pub packages: PackageList,
}

/// Read lock and awake flags out of `dumpsys window`. A missing marker means false.
pub fn parse_display_state(window_dump: &str) -> DeviceState {
    DeviceState {
        is_locked: window_dump.contains(LOCKED_MARKER),
        is_awake: window_dump.contains(AWAKE_MARKER),
    }
}

fn token_after<'a>(tokens: &[&'a str], key: &str) -> Result<&'a str> {
    tokens
        .iter()
        .position(|t| *t == key)
        .and_then(|i| tokens.get(i + 1))
        .copied()
        .ok_or_else(|| AdbError::ParseError(format!("'{}' not found in battery dump", key)))
}

/// Parse `dumpsys battery`
pub fn parse_battery(battery_dump: &str) -> Result<BatteryInfo> {
    let tokens: Vec<&str> = battery_dump.split_whitespace().collect();

    let raw_level = token_after(&tokens, "level:")?;
    let level = raw_level
        .parse::<u8>()
        .map_err(|_| AdbError::ParseError(format!("invalid battery level '{}'", raw_level)))?;

    let powered = |source: &str| -> Option<bool> {
        tokens
            .windows(3)
            .find(|w| w[0] == source && w[1] == "powered:")
            .map(|w| w[2] == "true")
    };

    let usb = powered("USB").ok_or_else(|| {
        AdbError::ParseError("'USB powered:' not found in battery dump".to_string())
    })?;
    let is_charging = usb || powered("AC").unwrap_or(false) || powered("Wireless").unwrap_or(false);

    Ok(BatteryInfo { level, is_charging })
}

/// Find a `getprop` value by its bracketed key, without the brackets
pub fn parse_property(props_dump: &str, key: &str) -> Result<String> {
    props_dump
        .lines()
        .find_map(|line| line.trim().strip_prefix(key))
        .map(|value| {
            value
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string()
        })
        .ok_or_else(|| AdbError::ParseError(format!("'{}' not found in property dump", key)))
}

/// Parse `pm list packages` output, one entry per non-empty line
pub fn parse_packages(packages_dump: &str) -> PackageList {
    PackageList::new(
        packages_dump
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Issues diagnostic dumps for a resolved device and parses them
#[derive(Clone)]
pub struct StateInspector {
    executor: Executor,
}

impl StateInspector {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Current lock and awake state
    pub async fn display_status(&self, device_id: &str) -> Result<DeviceState> {
        let dump = self
            .executor
            .run(&AdbCommand::dumpsys_window(device_id))
            .await?;
        let state = parse_display_state(&dump);
        debug!("Device {} state: {:?}", device_id, state);
        Ok(state)
    }

    /// Installed packages
    pub async fn packages(&self, device_id: &str) -> Result<PackageList> {
        let dump = self
            .executor
            .run(&AdbCommand::list_packages(device_id))
            .await?;
        Ok(parse_packages(&dump))
    }

    /// Full profile assembled from the window, battery, property and package dumps
    pub async fn phone_profile(&self, device_id: &str) -> Result<PhoneProfile> {
        let window = self
            .executor
            .run(&AdbCommand::dumpsys_window(device_id))
            .await?;
        let battery = self
            .executor
            .run(&AdbCommand::dumpsys_battery(device_id))
            .await?;
        let props = self.executor.run(&AdbCommand::getprop(device_id)).await?;
        let packages = self.packages(device_id).await?;

        Ok(PhoneProfile {
            brand: parse_property(&props, PROP_BRAND)?,
            model: parse_property(&props, PROP_MODEL)?,
            android_version: parse_property(&props, PROP_VERSION)?,
            battery: parse_battery(&battery)?,
            state: parse_display_state(&window),
            packages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRunner;
    use std::sync::Arc;

    const BATTERY: &str = "Current Battery Service state:\n  AC powered: false\n  USB powered: true\n  Wireless powered: false\n  Max charging current: 500000\n  status: 2\n  health: 2\n  present: true\n  level: 85\n  scale: 100\n";

    const PROPS: &str = "[ro.build.version.release]: [13]\n[ro.product.brand]: [Xiaomi]\n[ro.product.model]: [2209129SC]\n[ro.product.name]: [taoyao]\n";

    #[test]
    fn test_display_state_markers() {
        let dump = "mDreamingLockscreen=false mShowingDream=false\n  screenState=SCREEN_STATE_ON\n";
        assert_eq!(
            parse_display_state(dump),
            DeviceState {
                is_locked: false,
                is_awake: true
            }
        );

        let dump = "mDreamingLockscreen=true\n screenState=SCREEN_STATE_OFF";
        assert_eq!(
            parse_display_state(dump),
            DeviceState {
                is_locked: true,
                is_awake: false
            }
        );

        // Nothing recognisable is reported as unlocked and asleep, not unknown
        assert_eq!(
            parse_display_state(""),
            DeviceState {
                is_locked: false,
                is_awake: false
            }
        );
    }

    #[test]
    fn test_parse_battery() {
        let battery = parse_battery(BATTERY).unwrap();
        assert_eq!(battery.level, 85);
        assert!(battery.is_charging);

        let unplugged = BATTERY.replace("USB powered: true", "USB powered: false");
        assert!(!parse_battery(&unplugged).unwrap().is_charging);
    }

    #[test]
    fn test_battery_missing_keys() {
        assert!(matches!(
            parse_battery("AC powered: false\nUSB powered: false\n"),
            Err(AdbError::ParseError(_))
        ));
        assert!(matches!(
            parse_battery("level: 40\n"),
            Err(AdbError::ParseError(_))
        ));
        assert!(matches!(
            parse_battery("USB powered: true\nlevel: full\n"),
            Err(AdbError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_property_strips_brackets() {
        assert_eq!(parse_property(PROPS, PROP_BRAND).unwrap(), "Xiaomi");
        assert_eq!(parse_property(PROPS, PROP_VERSION).unwrap(), "13");

        let spaced = "[ro.product.model]: [Pixel 7 Pro]\n";
        assert_eq!(parse_property(spaced, PROP_MODEL).unwrap(), "Pixel 7 Pro");

        assert!(matches!(
            parse_property("[ro.product.name]: [x]", PROP_MODEL),
            Err(AdbError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_packages_drops_blank_lines() {
        let packages = parse_packages("package:com.android.chrome\r\npackage:com.whatsapp\r\n\r\n");
        assert_eq!(
            packages.list,
            vec!["package:com.android.chrome", "package:com.whatsapp"]
        );
        assert_eq!(packages.count, 2);
    }

    #[tokio::test]
    async fn test_phone_profile() {
        let mock = MockRunner::new()
            .on(
                "adb -s ABC123 shell dumpsys window",
                "mDreamingLockscreen=true screenState=SCREEN_STATE_OFF",
            )
            .on("adb -s ABC123 shell dumpsys battery", BATTERY)
            .on("adb -s ABC123 shell getprop", PROPS)
            .on("adb -s ABC123 shell pm list packages", "package:a\npackage:b\n");
        let inspector = StateInspector::new(Executor::new(Arc::new(mock)));

        let profile = inspector.phone_profile("ABC123").await.unwrap();
        assert_eq!(profile.brand, "Xiaomi");
        assert_eq!(profile.model, "2209129SC");
        assert_eq!(profile.android_version, "13");
        assert_eq!(profile.battery.level, 85);
        assert!(profile.state.is_locked);
        assert!(!profile.state.is_awake);
        assert_eq!(profile.packages.count, 2);
    }

    #[tokio::test]
    async fn test_phone_profile_missing_property_fails() {
        let mock = MockRunner::new()
            .on("adb -s ABC123 shell dumpsys battery", BATTERY)
            .on("adb -s ABC123 shell getprop", "[ro.product.brand]: [Xiaomi]\n");
        let inspector = StateInspector::new(Executor::new(Arc::new(mock)));

        let err = inspector.phone_profile("ABC123").await.unwrap_err();
        assert!(matches!(err, AdbError::ParseError(_)));
    }
}

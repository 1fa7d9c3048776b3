//! Precondition-checked device actions
//!
//! Every public action on [`Connector`] follows the same protocol:
//! 1. the device registry must not be empty (`AdbError::NoDevice`),
//! 2. any device listed as `unauthorized` produces a warning,
//! 3. the target is the pinned device id, else the first listed device,
//! 4. action-specific state checks run (awake, unlocked),
//! 5. the mapped adb command is issued and its result returned.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::result::ActionResult;
use crate::adb::{
    AdbCommand, CameraFacing, CaptureMode, CommandRunner, Device, DeviceRegistry, DeviceState,
    DeviceStatus, Executor, HostPlatform, PackageList, PhoneProfile, StateInspector,
    SystemRunner,
};
use crate::config::{
    get_app_keycode, get_navigation_keycode, list_navigation_actions, list_supported_apps,
    SequenceTimingConfig, KEYCODE_BRIGHTNESS_DOWN, KEYCODE_BRIGHTNESS_UP, KEYCODE_POWER,
    KEYCODE_SCREENSHOT, KEYCODE_TAB, KEYCODE_VOICE_ASSIST, KEYCODE_VOLUME_DOWN,
    KEYCODE_VOLUME_UP, TIMING_CONFIG,
};
use crate::error::{AdbError, Result};

const SMS_TAB_PRESSES: usize = 3;

/// Session object for driving devices through adb.
///
/// Holds the command runner, the sequence timing and an optional pinned
/// device id. Without a pinned id every action targets the first device adb
/// lists at the time of the call. Cloning is cheap and shares the runner.
///
/// Commands are issued one after another. Running actions from several
/// tasks against the same device interleaves their commands unpredictably.
#[derive(Clone)]
pub struct Connector {
    executor: Executor,
    registry: DeviceRegistry,
    inspector: StateInspector,
    timing: SequenceTimingConfig,
    device_id: Option<String>,
}

impl Connector {
    /// Connector spawning the configured adb executable
    pub fn new() -> Self {
        Self::with_runner(Arc::new(SystemRunner::new()))
    }

    /// Connector issuing commands through a custom runner
    pub fn with_runner(runner: Arc<dyn CommandRunner>) -> Self {
        let executor = Executor::new(runner);
        Self {
            registry: DeviceRegistry::new(executor.clone(), HostPlatform::current()),
            inspector: StateInspector::new(executor.clone()),
            executor,
            timing: TIMING_CONFIG.clone(),
            device_id: None,
        }
    }

    /// Parse device listings as produced on the given host platform
    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.registry = DeviceRegistry::new(self.executor.clone(), platform);
        self
    }

    /// Pin every action to one device id
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Override the sequence delays
    pub fn with_timing(mut self, timing: SequenceTimingConfig) -> Self {
        self.timing = timing;
        self
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn timing(&self) -> &SequenceTimingConfig {
        &self.timing
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    // Registry

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        self.registry.list_devices().await
    }

    pub async fn first_available(&self) -> Result<Option<Device>> {
        self.registry.first_available().await
    }

    /// Run the registry, authorization and resolution steps and return the target id
    pub async fn resolve_device(&self) -> Result<String> {
        let devices = self.registry.list_devices().await?;
        let first = devices.first().ok_or(AdbError::NoDevice)?;

        if devices.iter().any(|d| d.status == DeviceStatus::Unauthorized) {
            warn!(
                "Some devices are tagged with 'unauthorized' status, this may cause problems; \
                 allow USB debugging on the device"
            );
        }

        let id = match &self.device_id {
            Some(id) => {
                if !devices.iter().any(|d| &d.id == id) {
                    debug!("Pinned device {} is not in the current listing", id);
                }
                id.clone()
            }
            None => first.id.clone(),
        };
        debug!("Resolved target device: {}", id);
        Ok(id)
    }

    // State

    /// Lock and awake state of the target device
    pub async fn display_status(&self) -> Result<DeviceState> {
        let device = self.resolve_device().await?;
        self.inspector.display_status(&device).await
    }

    /// Identity, battery, state and packages of the target device
    pub async fn phone_profile(&self) -> Result<PhoneProfile> {
        let device = self.resolve_device().await?;
        self.inspector.phone_profile(&device).await
    }

    /// Installed packages of the target device
    pub async fn packages(&self) -> Result<PackageList> {
        let device = self.resolve_device().await?;
        self.inspector.packages(&device).await
    }

    pub(crate) async fn state_of(&self, device: &str) -> Result<DeviceState> {
        self.inspector.display_status(device).await
    }

    // Primitive actions on a resolved device

    pub(crate) async fn key_event(&self, device: &str, code: u16) -> Result<ActionResult> {
        let sent = self
            .executor
            .run_confirmed(&AdbCommand::keyevent(device, code))
            .await?;
        Ok(ActionResult::heuristic(sent))
    }

    async fn repeat_key_event(&self, code: u16, times: u32) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        let mut any_sent = false;
        for _ in 0..times {
            if self.key_event(&device, code).await?.success {
                any_sent = true;
            }
        }
        Ok(ActionResult::heuristic(any_sent))
    }

    pub(crate) async fn tap_on(&self, device: &str, x: i32, y: i32) -> Result<ActionResult> {
        let sent = self
            .executor
            .run_confirmed(&AdbCommand::tap(device, x, y))
            .await?;
        Ok(ActionResult::heuristic(sent))
    }

    pub(crate) async fn swipe_on(
        &self,
        device: &str,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: Option<u32>,
    ) -> Result<ActionResult> {
        if !self.state_of(device).await?.is_awake {
            warn!("Swipe rejected: phone need to be awake");
            return Ok(ActionResult::rejected("phone need to be awake"));
        }
        self.send_swipe(device, from, to, duration_ms).await
    }

    /// Swipe without reading the screen state first
    pub(crate) async fn send_swipe(
        &self,
        device: &str,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: Option<u32>,
    ) -> Result<ActionResult> {
        let sent = self
            .executor
            .run_confirmed(&AdbCommand::swipe(device, from, to, duration_ms))
            .await?;
        Ok(ActionResult::heuristic(sent))
    }

    pub(crate) async fn insert_text_on(&self, device: &str, text: &str) -> Result<ActionResult> {
        let sent = self
            .executor
            .run_confirmed(&AdbCommand::input_text(device, text))
            .await?;
        Ok(ActionResult::heuristic(sent))
    }

    pub(crate) async fn launch_camera_on(
        &self,
        device: &str,
        mode: CaptureMode,
        facing: CameraFacing,
    ) -> Result<ActionResult> {
        let launched = self
            .executor
            .run_intent(&AdbCommand::capture_intent(device, mode, facing))
            .await?;
        Ok(ActionResult::heuristic(launched))
    }

    /// Log one line per tick and wait, `seconds` times
    pub(crate) async fn countdown(&self, label: &str, seconds: u32) {
        for i in 1..=seconds {
            let left = seconds - i;
            if left == 0 {
                info!("{}", label);
            } else {
                info!("{} in {}", label, left);
            }
            sleep(self.timing.tick()).await;
        }
    }

    // Key-event actions

    /// Take a screenshot on the device. Does not wake the screen.
    pub async fn screenshot(&self) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.key_event(&device, KEYCODE_SCREENSHOT).await
    }

    /// Press the power button
    pub async fn power_button(&self) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.key_event(&device, KEYCODE_POWER).await
    }

    pub async fn volume_up(&self, times: u32) -> Result<ActionResult> {
        self.repeat_key_event(KEYCODE_VOLUME_UP, times).await
    }

    pub async fn volume_down(&self, times: u32) -> Result<ActionResult> {
        self.repeat_key_event(KEYCODE_VOLUME_DOWN, times).await
    }

    pub async fn brightness_up(&self, times: u32) -> Result<ActionResult> {
        self.repeat_key_event(KEYCODE_BRIGHTNESS_UP, times).await
    }

    pub async fn brightness_down(&self, times: u32) -> Result<ActionResult> {
        self.repeat_key_event(KEYCODE_BRIGHTNESS_DOWN, times).await
    }

    /// Open the voice assistant
    pub async fn voice_assistant(&self) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.key_event(&device, KEYCODE_VOICE_ASSIST).await
    }

    /// Type text into the focused field
    pub async fn insert_text(&self, text: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.insert_text_on(&device, text).await
    }

    // Gestures

    pub async fn tap(&self, x: i32, y: i32) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.tap_on(&device, x, y).await
    }

    /// Swipe between two points. Rejected while the screen is off.
    pub async fn swipe(
        &self,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: Option<u32>,
    ) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.swipe_on(&device, from, to, duration_ms).await
    }

    // Apps

    /// Open a system app by name.
    ///
    /// Fails with `AdbError::Precondition` while the device is locked. An
    /// unknown name returns a failed result listing the supported names.
    pub async fn open_app(&self, app_name: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;

        if self.state_of(&device).await?.is_locked {
            return Err(AdbError::Precondition(
                "the device need to be unlocked".to_string(),
            ));
        }

        match get_app_keycode(app_name) {
            Some(code) => self.key_event(&device, code).await,
            None => {
                let message = format!(
                    "app not supported yet, choose one of these: {}",
                    list_supported_apps().join(", ")
                );
                warn!("{}", message);
                Ok(ActionResult::rejected(message))
            }
        }
    }

    pub async fn open_call_log(&self) -> Result<ActionResult> {
        self.open_app("call_log").await
    }

    pub async fn open_calendar(&self) -> Result<ActionResult> {
        self.open_app("calendar").await
    }

    pub async fn open_music(&self) -> Result<ActionResult> {
        self.open_app("music").await
    }

    pub async fn open_calculator(&self) -> Result<ActionResult> {
        self.open_app("calculator").await
    }

    pub async fn open_email(&self) -> Result<ActionResult> {
        self.open_app("email").await
    }

    pub async fn open_browser(&self) -> Result<ActionResult> {
        self.open_app("browser").await
    }

    /// Launch the camera through a capture intent
    pub async fn open_camera(&self, mode: CaptureMode, facing: CameraFacing) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.launch_camera_on(&device, mode, facing).await
    }

    // Navigation

    /// Send a navigation key event.
    ///
    /// Returns a failed result without sending anything while the screen is
    /// off. Unknown actions fail with `AdbError::UnsupportedAction`.
    pub async fn navigate(&self, action: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;

        if !self.state_of(&device).await?.is_awake {
            warn!("Navigation '{}' rejected: device is asleep", action);
            return Ok(ActionResult::rejected(
                "device need to be awake to execute navigation command",
            ));
        }

        let code = get_navigation_keycode(action).ok_or_else(|| AdbError::UnsupportedAction {
            action: action.to_string(),
            supported: list_navigation_actions()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })?;

        self.key_event(&device, code).await
    }

    pub async fn home(&self) -> Result<ActionResult> {
        self.navigate("home").await
    }

    pub async fn back(&self) -> Result<ActionResult> {
        self.navigate("back").await
    }

    pub async fn foreground_apps(&self) -> Result<ActionResult> {
        self.navigate("foreground").await
    }

    pub async fn notification_center(&self) -> Result<ActionResult> {
        self.navigate("notification_center").await
    }

    // Intents

    /// Start a phone call. Works on a locked device.
    pub async fn call(&self, phone_number: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        let launched = self
            .executor
            .run_intent(&AdbCommand::call_intent(&device, phone_number))
            .await?;
        Ok(ActionResult::heuristic(launched))
    }

    /// Compose an SMS and move focus to the send control.
    ///
    /// The device has to be awake and unlocked for the focus moves; otherwise
    /// the composer is left open and a failed result is returned.
    pub async fn send_sms(&self, phone_number: &str, message: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        let launched = self
            .executor
            .run_intent(&AdbCommand::sms_intent(&device, phone_number, message))
            .await?;
        if !launched {
            return Ok(ActionResult::heuristic(false).with_message("SMS composer did not start"));
        }

        let state = self.state_of(&device).await?;
        if state.is_locked || !state.is_awake {
            warn!("SMS not sent: the phone need to be unlocked");
            return Ok(ActionResult::rejected("the phone need to be unlocked"));
        }

        for _ in 0..SMS_TAB_PRESSES {
            self.key_event(&device, KEYCODE_TAB).await?;
        }
        Ok(ActionResult::heuristic(true))
    }

    // Packages and logs

    /// Install an apk. The user may have to allow the install on the device.
    pub async fn install_apk(&self, path: impl AsRef<Path>) -> Result<ActionResult> {
        let path = path.as_ref();
        let device = self.resolve_device().await?;

        let real_path = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| AdbError::ApkNotFound(path.to_path_buf()))?;

        info!("Install request sent to device {}", device);
        let output = self
            .executor
            .run(&AdbCommand::install(&device, &real_path.to_string_lossy()))
            .await?;
        Ok(ActionResult::heuristic(output.contains("Success")))
    }

    /// Uninstall a package, keeping its data. Accepts `pm list packages` entries.
    pub async fn uninstall_apk(&self, package_name: &str) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        let package = package_name.trim_start_matches("package:");
        let output = self
            .executor
            .run(&AdbCommand::uninstall(&device, package))
            .await?;
        Ok(ActionResult::heuristic(output.contains("Success")))
    }

    /// Stream the device log to the terminal until logcat exits
    pub async fn start_logcat(&self, term: Option<&str>) -> Result<()> {
        let device = self.resolve_device().await?;
        self.executor
            .attach(&AdbCommand::logcat(&device, term))
            .await
    }

    // Power

    /// Power the device off after an optional countdown in seconds
    pub async fn turn_off(&self, countdown: u32) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.countdown("SHUTDOWN", countdown).await;
        let sent = self
            .executor
            .run_confirmed(&AdbCommand::power_off(&device))
            .await?;
        Ok(ActionResult::heuristic(sent))
    }

    /// Reboot the device after an optional countdown in seconds
    pub async fn reboot(&self, countdown: u32) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        self.countdown("REBOOT", countdown).await;
        let output = self.executor.run(&AdbCommand::reboot(&device)).await?;
        if output.is_empty() {
            Ok(ActionResult::heuristic(true))
        } else {
            warn!("Reboot returned: {}", output.trim());
            Ok(ActionResult::heuristic(false).with_message(output.trim()))
        }
    }

    pub(crate) async fn pause(&self, duration: Duration) {
        sleep(duration).await;
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

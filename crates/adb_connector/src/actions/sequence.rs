//! Composite, timing-sensitive action sequences

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::dispatcher::Connector;
use super::result::{ActionResult, SequenceReport};
use crate::adb::{CameraFacing, CaptureMode};
use crate::config::{KEYCODE_ENTER, KEYCODE_POWER, KEYCODE_ZOOM_IN, KEYCODE_ZOOM_OUT};
use crate::error::Result;

const UNLOCK_SWIPE_FROM: (i32, i32) = (200, 500);
const UNLOCK_SWIPE_TO: (i32, i32) = (200, 0);

/// One tap of a gesture sequence, performed `delay_ms` after the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureStep {
    #[serde(alias = "milliseconds")]
    pub delay_ms: u64,
    pub x: i32,
    pub y: i32,
}

impl GestureStep {
    pub fn new(delay_ms: u64, x: i32, y: i32) -> Self {
        Self { delay_ms, x, y }
    }
}

/// Ordered taps with per-step delays
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureSequence {
    steps: Vec<GestureStep>,
}

impl GestureSequence {
    pub fn new(steps: Vec<GestureStep>) -> Self {
        Self { steps }
    }

    /// `times` taps on one point, the first immediately and the rest `delay_ms` apart
    pub fn repeated(x: i32, y: i32, times: u32, delay_ms: u64) -> Self {
        let steps = (0..times)
            .map(|i| GestureStep::new(if i == 0 { 0 } else { delay_ms }, x, y))
            .collect();
        Self { steps }
    }

    /// Parse a JSON array of `{"delay_ms", "x", "y"}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn steps(&self) -> &[GestureStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Camera selection and zoom steps for a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureOptions {
    pub facing: CameraFacing,
    pub zoom_in: u32,
    pub zoom_out: u32,
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_zoom_in(mut self, steps: u32) -> Self {
        self.zoom_in = steps;
        self
    }

    pub fn with_zoom_out(mut self, steps: u32) -> Self {
        self.zoom_out = steps;
        self
    }
}

impl Connector {
    /// Unlock the screen, optionally typing a password.
    ///
    /// Succeeds immediately when the device is not locked. Otherwise wakes
    /// the screen if needed, swipes up, types the password and checks the
    /// lock state exactly once; a device still locked at that point is a
    /// failure, not retried.
    pub async fn unlock_screen(&self, password: Option<&str>) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        let state = self.state_of(&device).await?;

        if !state.is_locked {
            return Ok(ActionResult::verified(true).with_message("device already unlocked"));
        }

        if !state.is_awake {
            self.key_event(&device, KEYCODE_POWER).await?;
            self.pause(self.timing().settle()).await;
        }

        // The screen may still report off right after the power press
        if !self
            .send_swipe(&device, UNLOCK_SWIPE_FROM, UNLOCK_SWIPE_TO, None)
            .await?
            .success
        {
            warn!("Unlock swipe on {} returned output", device);
        }
        self.pause(self.timing().settle()).await;

        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.insert_text_on(&device, password).await?;
        }
        self.pause(self.timing().settle()).await;

        let unlocked = !self.state_of(&device).await?.is_locked;
        if !unlocked {
            warn!("Device {} is still locked after the unlock attempt", device);
        }
        Ok(ActionResult::verified(unlocked))
    }

    /// Open the camera, apply zoom steps and press the shutter twice.
    ///
    /// Returns `None` when the capture intent was not acknowledged; nothing
    /// after the intent is sent in that case.
    async fn prepare_capture(
        &self,
        device: &str,
        mode: CaptureMode,
        options: CaptureOptions,
    ) -> Result<Option<ActionResult>> {
        if !self.launch_camera_on(device, mode, options.facing).await?.success {
            warn!("Camera intent was not acknowledged by {}", device);
            return Ok(None);
        }

        // All zoom-in steps strictly before any zoom-out step
        for _ in 0..options.zoom_in {
            self.pause(self.timing().zoom_step()).await;
            self.key_event(device, KEYCODE_ZOOM_IN).await?;
        }
        for _ in 0..options.zoom_out {
            self.pause(self.timing().zoom_step()).await;
            self.key_event(device, KEYCODE_ZOOM_OUT).await?;
        }

        self.pause(self.timing().shutter()).await;
        self.key_event(device, KEYCODE_ENTER).await?;
        self.pause(self.timing().shutter()).await;
        Ok(Some(self.key_event(device, KEYCODE_ENTER).await?))
    }

    /// Take a photo
    pub async fn take_picture(&self, options: CaptureOptions) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        Ok(self
            .prepare_capture(&device, CaptureMode::Photo, options)
            .await?
            .unwrap_or_else(|| ActionResult::heuristic(false).with_message("camera did not open")))
    }

    /// Record a video, stopping after `duration_secs` (immediately when 0)
    pub async fn video_capture(
        &self,
        options: CaptureOptions,
        duration_secs: u32,
    ) -> Result<ActionResult> {
        let device = self.resolve_device().await?;
        if self
            .prepare_capture(&device, CaptureMode::Video, options)
            .await?
            .is_none()
        {
            return Ok(ActionResult::heuristic(false).with_message("camera did not open"));
        }

        for elapsed in 0..duration_secs {
            info!("video will be stopped in {}", duration_secs - elapsed);
            self.pause(self.timing().tick()).await;
        }

        self.key_event(&device, KEYCODE_ENTER).await
    }

    /// Run a gesture sequence: wait each step's delay, then tap.
    ///
    /// Steps are best-effort; a failed tap is recorded and the remaining
    /// steps still run.
    pub async fn gesture_sequence(&self, sequence: GestureSequence) -> Result<SequenceReport> {
        let device = self.resolve_device().await?;
        let mut steps = Vec::with_capacity(sequence.len());

        for (i, step) in sequence.steps.into_iter().enumerate() {
            self.pause(Duration::from_millis(step.delay_ms)).await;
            let result = match self.tap_on(&device, step.x, step.y).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Gesture step {} at ({}, {}) failed: {}", i, step.x, step.y, e);
                    ActionResult::heuristic(false).with_message(e.to_string())
                }
            };
            debug!("Gesture step {} -> {}", i, result.success);
            steps.push(result);
        }

        Ok(SequenceReport { steps })
    }

    /// Tap one point `times` times, `delay_ms` apart
    pub async fn multi_tap(
        &self,
        x: i32,
        y: i32,
        times: u32,
        delay_ms: u64,
    ) -> Result<SequenceReport> {
        self.gesture_sequence(GestureSequence::repeated(x, y, times, delay_ms))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::HostPlatform;
    use crate::config::SequenceTimingConfig;
    use crate::error::AdbError;
    use crate::mock::MockRunner;
    use std::sync::Arc;
    use tokio::time::Instant;

    const ONE_DEVICE: &str = "List of devices attached\nABC123\tdevice\n\n";
    const WINDOW: &str = "adb -s ABC123 shell dumpsys window";
    const UNLOCKED: &str = "mDreamingLockscreen=false screenState=SCREEN_STATE_ON";
    const LOCKED_AWAKE: &str = "mDreamingLockscreen=true screenState=SCREEN_STATE_ON";
    const LOCKED_ASLEEP: &str = "mDreamingLockscreen=true screenState=SCREEN_STATE_OFF";
    const PHOTO_INTENT: &str = "adb -s ABC123 shell am start -a android.media.action.IMAGE_CAPTURE --ei android.intent.extras.CAMERA_FACING 0";
    const VIDEO_INTENT_FRONT: &str = "adb -s ABC123 shell am start -a android.media.action.VIDEO_CAPTURE --ei android.intent.extras.CAMERA_FACING 1";
    const INTENT_ACK: &str = "Starting: Intent { act=android.media.action.IMAGE_CAPTURE }\n";

    fn timing() -> SequenceTimingConfig {
        SequenceTimingConfig {
            settle_delay: 0.5,
            zoom_step_delay: 0.5,
            shutter_delay: 1.0,
            countdown_tick: 1.0,
        }
    }

    fn connector(mock: &MockRunner) -> Connector {
        Connector::with_runner(Arc::new(mock.clone()))
            .with_platform(HostPlatform::Unix)
            .with_timing(timing())
    }

    fn keyevent(code: u16) -> String {
        format!("adb -s ABC123 shell input keyevent {}", code)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_is_noop_when_unlocked() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on(WINDOW, UNLOCKED);
        let result = connector(&mock).unlock_screen(Some("1234")).await.unwrap();

        assert!(result.success);
        assert!(result.is_verified());
        assert_eq!(mock.device_commands(), vec![WINDOW]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_with_password_succeeds() {
        // before, final check
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on_sequence(WINDOW, &[LOCKED_ASLEEP, UNLOCKED]);
        let result = connector(&mock).unlock_screen(Some("1234")).await.unwrap();

        assert!(result.success);
        assert_eq!(
            mock.device_commands(),
            vec![
                WINDOW.to_string(),
                keyevent(26),
                "adb -s ABC123 shell input swipe 200 500 200 0".to_string(),
                "adb -s ABC123 shell input text 1234".to_string(),
                WINDOW.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_checks_exactly_once() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on(WINDOW, LOCKED_AWAKE);
        let result = connector(&mock).unlock_screen(Some("0000")).await.unwrap();

        assert!(!result.success);
        assert!(result.is_verified());
        assert_eq!(mock.count(WINDOW), 2);
        assert_eq!(mock.count("adb -s ABC123 shell input swipe 200 500 200 0"), 1);
        assert_eq!(mock.count(&keyevent(26)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_swipes_while_screen_still_reports_off() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on_sequence(WINDOW, &[LOCKED_ASLEEP, LOCKED_ASLEEP]);
        let result = connector(&mock).unlock_screen(Some("1234")).await.unwrap();

        assert!(!result.success);
        assert_eq!(
            mock.device_commands(),
            vec![
                WINDOW.to_string(),
                keyevent(26),
                "adb -s ABC123 shell input swipe 200 500 200 0".to_string(),
                "adb -s ABC123 shell input text 1234".to_string(),
                WINDOW.to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlock_without_password_types_nothing() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on_sequence(WINDOW, &[LOCKED_AWAKE, UNLOCKED]);
        let started = Instant::now();
        let result = connector(&mock).unlock_screen(None).await.unwrap();

        assert!(result.success);
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(mock
            .device_commands()
            .iter()
            .all(|c| !c.contains("input text")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zoom_in_strictly_before_zoom_out() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on(PHOTO_INTENT, INTENT_ACK);
        let options = CaptureOptions::new().with_zoom_in(2).with_zoom_out(3);
        let result = connector(&mock).take_picture(options).await.unwrap();
        assert!(result.success);

        let mut expected = vec![PHOTO_INTENT.to_string()];
        expected.extend(vec![keyevent(168); 2]);
        expected.extend(vec![keyevent(169); 3]);
        expected.extend(vec![keyevent(66); 2]);
        assert_eq!(mock.device_commands(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_aborts_when_intent_fails() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on(PHOTO_INTENT, "Error: Activity not started\n");
        let options = CaptureOptions::new().with_zoom_in(2);
        let result = connector(&mock).take_picture(options).await.unwrap();

        assert!(!result.success);
        assert_eq!(mock.device_commands(), vec![PHOTO_INTENT]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_counts_down_before_stop() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .on(VIDEO_INTENT_FRONT, INTENT_ACK);
        let options = CaptureOptions::new().with_facing(CameraFacing::Front);
        let started = Instant::now();
        let result = connector(&mock).video_capture(options, 5).await.unwrap();

        assert!(result.success);
        // two shutter delays plus five countdown ticks
        assert!(started.elapsed() >= Duration::from_secs(7));
        assert_eq!(mock.count(&keyevent(66)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gesture_sequence_timing_and_best_effort() {
        let mock = MockRunner::new()
            .on("adb devices", ONE_DEVICE)
            .fail("adb -s ABC123 shell input tap 20 20", "error: closed");
        let sequence = GestureSequence::new(vec![
            GestureStep::new(0, 10, 10),
            GestureStep::new(1300, 20, 20),
            GestureStep::new(250, 30, 30),
        ]);
        let started = Instant::now();
        let report = connector(&mock).gesture_sequence(sequence).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1550));
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert!(!report.steps[1].success);
        assert_eq!(mock.count("adb -s ABC123 shell input tap 30 30"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_tap() {
        let mock = MockRunner::new().on("adb devices", ONE_DEVICE);
        let report = connector(&mock).multi_tap(500, 700, 4, 250).await.unwrap();
        assert!(report.all_succeeded());
        assert_eq!(mock.count("adb -s ABC123 shell input tap 500 700"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequences_need_a_device() {
        let mock = MockRunner::new().on("adb devices", "List of devices attached\n\n");
        let c = connector(&mock);
        assert!(matches!(c.unlock_screen(None).await, Err(AdbError::NoDevice)));
        assert!(matches!(
            c.take_picture(CaptureOptions::new()).await,
            Err(AdbError::NoDevice)
        ));
        assert!(matches!(c.multi_tap(1, 1, 2, 10).await, Err(AdbError::NoDevice)));
        assert!(mock.device_commands().is_empty());
    }

    #[test]
    fn test_gesture_sequence_from_json() {
        let sequence = GestureSequence::from_json(
            r#"[{"milliseconds": 0, "x": 500, "y": 700}, {"delay_ms": 1300, "x": 500, "y": 700}]"#,
        )
        .unwrap();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence.steps()[1], GestureStep::new(1300, 500, 700));

        assert!(matches!(
            GestureSequence::from_json(r#"[{"x": 1}]"#),
            Err(AdbError::InvalidSequence(_))
        ));
    }

    #[test]
    fn test_repeated_sequence_first_step_immediate() {
        let sequence = GestureSequence::repeated(1, 2, 3, 250);
        let delays: Vec<u64> = sequence.steps().iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, vec![0, 250, 250]);
    }
}

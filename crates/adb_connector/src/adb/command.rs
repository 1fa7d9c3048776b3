//! Command lines understood by the adb bridge
//!
//! Each constructor below reproduces one adb invocation exactly. The
//! rendered form (`to_string()`) is the command line as a shell would see
//! it, and is what gets logged and what tests compare against.

use std::fmt;

/// Which camera the capture intents should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    #[default]
    Rear,
    Front,
}

impl CameraFacing {
    fn extra_value(self) -> u8 {
        match self {
            CameraFacing::Rear => 0,
            CameraFacing::Front => 1,
        }
    }
}

/// Still photo or video capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

impl CaptureMode {
    fn intent_action(self) -> &'static str {
        match self {
            CaptureMode::Photo => "android.media.action.IMAGE_CAPTURE",
            CaptureMode::Video => "android.media.action.VIDEO_CAPTURE",
        }
    }
}

/// An adb invocation: the argument vector passed after the adb executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbCommand {
    args: Vec<String>,
}

impl AdbCommand {
    /// Command not bound to any device (`adb devices`, `adb start-server`, ...)
    pub fn global<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Command addressed to one device with `-s <id>`
    pub fn for_device<I, S>(device_id: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec!["-s".to_string(), device_id.to_string()];
        all.extend(args.into_iter().map(Into::into));
        Self { args: all }
    }

    /// Append one more argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    // Server and registry

    pub fn devices() -> Self {
        Self::global(["devices"])
    }

    pub fn version() -> Self {
        Self::global(["--version"])
    }

    pub fn start_server() -> Self {
        Self::global(["start-server"])
    }

    pub fn kill_server() -> Self {
        Self::global(["kill-server"])
    }

    // Diagnostics

    pub fn dumpsys_window(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "dumpsys", "window"])
    }

    pub fn dumpsys_battery(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "dumpsys", "battery"])
    }

    pub fn getprop(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "getprop"])
    }

    pub fn list_packages(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "pm", "list", "packages"])
    }

    // Input

    pub fn keyevent(device_id: &str, code: u16) -> Self {
        Self::for_device(device_id, ["shell", "input", "keyevent"]).arg(code.to_string())
    }

    pub fn input_text(device_id: &str, text: &str) -> Self {
        Self::for_device(device_id, ["shell", "input", "text", text])
    }

    pub fn tap(device_id: &str, x: i32, y: i32) -> Self {
        Self::for_device(device_id, ["shell", "input", "tap"])
            .arg(x.to_string())
            .arg(y.to_string())
    }

    /// Swipe between two points; the duration is only emitted when given
    pub fn swipe(
        device_id: &str,
        from: (i32, i32),
        to: (i32, i32),
        duration_ms: Option<u32>,
    ) -> Self {
        let cmd = Self::for_device(device_id, ["shell", "input", "swipe"])
            .arg(from.0.to_string())
            .arg(from.1.to_string())
            .arg(to.0.to_string())
            .arg(to.1.to_string());
        match duration_ms {
            Some(ms) => cmd.arg(ms.to_string()),
            None => cmd,
        }
    }

    // Intents

    pub fn capture_intent(device_id: &str, mode: CaptureMode, facing: CameraFacing) -> Self {
        Self::for_device(
            device_id,
            [
                "shell",
                "am",
                "start",
                "-a",
                mode.intent_action(),
                "--ei",
                "android.intent.extras.CAMERA_FACING",
            ],
        )
        .arg(facing.extra_value().to_string())
    }

    pub fn call_intent(device_id: &str, number: &str) -> Self {
        Self::for_device(
            device_id,
            ["shell", "am", "start", "-a", "android.intent.action.CALL", "-d"],
        )
        .arg(format!("tel:'{}'", number))
    }

    pub fn sms_intent(device_id: &str, number: &str, message: &str) -> Self {
        Self::for_device(
            device_id,
            ["shell", "am", "start", "-a", "android.intent.action.SENDTO", "-d"],
        )
        .arg(format!("sms:'{}'", number))
        .arg("--es")
        .arg("sms_body")
        .arg(format!("'{}'", message))
    }

    // Packages, logs, power

    pub fn install(device_id: &str, path: &str) -> Self {
        Self::for_device(device_id, ["install", path])
    }

    pub fn uninstall(device_id: &str, package: &str) -> Self {
        Self::for_device(device_id, ["uninstall", "-k", "--user", "0", package])
    }

    pub fn logcat(device_id: &str, term: Option<&str>) -> Self {
        let cmd = Self::for_device(device_id, ["logcat"]);
        match term {
            Some(term) => cmd.arg(format!("--regex={}", term)),
            None => cmd,
        }
    }

    pub fn power_off(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "reboot", "-p"])
    }

    pub fn reboot(device_id: &str) -> Self {
        Self::for_device(device_id, ["shell", "reboot"])
    }
}

impl fmt::Display for AdbCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("adb")?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

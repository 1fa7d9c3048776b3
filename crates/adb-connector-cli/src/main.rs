//! adbc - Command-line interface for adb_connector
//!
//! Usage:
//!     adbc [OPTIONS] <COMMAND>
//!
//! Environment Variables:
//!     ADB_CONNECTOR_DEVICE_ID: Device id to target in multi-device setups
//!     ADB_CONNECTOR_ADB_PATH: adb executable (default: adb)
//!     ADB_CONNECTOR_SETTLE_DELAY: Seconds between unlock steps (default: 0.5)
//!     ADB_CONNECTOR_ZOOM_STEP_DELAY: Seconds between zoom presses (default: 0.5)
//!     ADB_CONNECTOR_SHUTTER_DELAY: Seconds around each shutter press (default: 1.0)
//!     ADB_CONNECTOR_COUNTDOWN_TICK: Seconds per countdown tick (default: 1.0)
//!     RUST_LOG: Log filter, overrides --verbose

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use adb_connector::config::CONNECTION_CONFIG;
use adb_connector::{
    list_navigation_actions, list_supported_apps, ActionResult, CameraFacing, CaptureMode,
    CaptureOptions, Connector, GestureSequence, SequenceReport,
};

/// adbc - drive an Android device over adb
#[derive(Parser, Debug)]
#[command(name = "adbc", version)]
#[command(about = "Drive an Android device over adb")]
#[command(after_help = r#"Examples:
    # List connected devices
    adbc devices

    # Show lock and screen state as JSON
    adbc --json status

    # Unlock with a PIN, then go home
    adbc unlock --password 1234 && adbc navigate home

    # Take a photo with the front camera, zoomed in twice
    adbc photo --front --zoom-in 2

    # Replay a recorded tap sequence
    adbc gestures taps.json

    # Target one device among several
    adbc -d emulator-5554 screenshot
"#)]
struct Cli {
    /// Device id (default: first listed device)
    #[arg(short = 'd', long, global = true, env = "ADB_CONNECTOR_DEVICE_ID")]
    device_id: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log adb command lines and parsed state
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List connected devices
    Devices,

    /// Show adb version and executable path
    Info,

    /// Start the adb server
    StartServer,

    /// Kill the adb server
    KillServer,

    /// Show lock and screen state
    Status,

    /// Show brand, model, Android version, battery, state and packages
    Profile,

    /// List installed packages
    Packages,

    /// Take a screenshot on the device
    Screenshot,

    /// Press the power button
    Power,

    /// Press a volume key
    Volume {
        direction: Direction,

        /// Number of presses
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Press a brightness key
    Brightness {
        direction: Direction,

        /// Number of presses
        #[arg(long, default_value_t = 1)]
        times: u32,
    },

    /// Type text into the focused field
    Text { text: String },

    /// Tap a point
    Tap { x: i32, y: i32 },

    /// Swipe between two points
    Swipe {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,

        /// Swipe duration in milliseconds
        #[arg(long)]
        duration: Option<u32>,
    },

    /// Open a system app (see list-apps)
    OpenApp { name: String },

    /// Run a navigation action (home, back, foreground, notification_center)
    Navigate { action: String },

    /// Launch the voice assistant
    VoiceAssistant,

    /// Start a phone call
    Call { number: String },

    /// Open a prefilled SMS and move focus to send
    Sms { number: String, message: String },

    /// Open the camera without capturing
    Camera {
        /// Open in video mode
        #[arg(long)]
        video: bool,

        /// Use the front camera
        #[arg(long)]
        front: bool,
    },

    /// Take a photo
    Photo {
        #[command(flatten)]
        capture: CaptureArgs,
    },

    /// Record a video
    Video {
        #[command(flatten)]
        capture: CaptureArgs,

        /// Recording length in seconds
        #[arg(long, default_value_t = 5)]
        duration: u32,
    },

    /// Unlock the screen
    Unlock {
        /// Password or PIN to type after the swipe
        #[arg(long)]
        password: Option<String>,
    },

    /// Replay a gesture sequence from a JSON file
    Gestures { file: PathBuf },

    /// Tap one point repeatedly
    MultiTap {
        x: i32,
        y: i32,

        #[arg(long, default_value_t = 2)]
        times: u32,

        /// Delay between taps in milliseconds
        #[arg(long, default_value_t = 100)]
        delay: u64,
    },

    /// Install an APK
    Install { apk: PathBuf },

    /// Uninstall a package, keeping its data
    Uninstall { package: String },

    /// Stream logcat, optionally filtered by a regex
    Logcat { term: Option<String> },

    /// Reboot the device after a countdown
    Reboot {
        #[arg(long, default_value_t = 0)]
        countdown: u32,
    },

    /// Power the device off after a countdown
    TurnOff {
        #[arg(long, default_value_t = 0)]
        countdown: u32,
    },

    /// List supported app and navigation names
    ListApps,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

#[derive(clap::Args, Debug)]
struct CaptureArgs {
    /// Use the front camera
    #[arg(long)]
    front: bool,

    /// Zoom-in presses before capture
    #[arg(long, default_value_t = 0)]
    zoom_in: u32,

    /// Zoom-out presses before capture
    #[arg(long, default_value_t = 0)]
    zoom_out: u32,
}

impl CaptureArgs {
    fn options(&self) -> CaptureOptions {
        CaptureOptions::new()
            .with_facing(facing(self.front))
            .with_zoom_in(self.zoom_in)
            .with_zoom_out(self.zoom_out)
    }
}

fn facing(front: bool) -> CameraFacing {
    if front {
        CameraFacing::Front
    } else {
        CameraFacing::Rear
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "adb_connector=debug,info"
    } else {
        "adb_connector=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\u{274C} Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Verify the adb executable can be found before talking to devices
fn check_adb() -> Result<()> {
    let adb = &CONNECTION_CONFIG.adb_path;
    which::which(adb).map_err(|_| {
        anyhow!(
            "{} is not installed or not in PATH.\n   Solution: Install adb:\n     \
             - macOS: brew install android-platform-tools\n     \
             - Linux: sudo apt install android-tools-adb\n     \
             - Windows: Download from https://developer.android.com/studio/releases/platform-tools",
            adb
        )
    })?;
    Ok(())
}

/// Run one subcommand; `Ok(false)` means the action reported failure
async fn run(cli: Cli) -> Result<bool> {
    if !matches!(cli.command, Command::ListApps) {
        check_adb()?;
    }

    let mut connector = Connector::new();
    if let Some(device_id) = &cli.device_id {
        connector = connector.with_device(device_id.clone());
    }
    let json = cli.json;

    let result = match cli.command {
        Command::Devices => {
            let devices = connector.list_devices().await?;
            if json {
                print_json(&devices)?;
            } else if devices.is_empty() {
                println!("No devices connected.");
            } else {
                println!("Connected devices:");
                println!("{}", "-".repeat(50));
                for device in &devices {
                    println!("  \u{2713} {:<30} {}", device.id, device.status);
                }
            }
            return Ok(true);
        }
        Command::Info => {
            let info = connector.registry().adb_info().await?;
            if json {
                print_json(&info)?;
            } else {
                println!("adb version: {}", info.version);
                if let Some(path) = &info.executable {
                    println!("Executable:  {}", path);
                }
            }
            return Ok(true);
        }
        Command::StartServer => {
            let output = connector.registry().start_server().await?;
            print_raw(&output);
            return Ok(true);
        }
        Command::KillServer => {
            let output = connector.registry().kill_server().await?;
            print_raw(&output);
            return Ok(true);
        }
        Command::Status => {
            let state = connector.display_status().await?;
            if json {
                print_json(&state)?;
            } else {
                println!("Locked: {}", yes_no(state.is_locked));
                println!("Awake:  {}", yes_no(state.is_awake));
            }
            return Ok(true);
        }
        Command::Profile => {
            let profile = connector.phone_profile().await?;
            if json {
                print_json(&profile)?;
            } else {
                println!("\u{1F4F1} {} {}", profile.brand, profile.model);
                println!("{}", "-".repeat(50));
                println!("Android:   {}", profile.android_version);
                println!(
                    "Battery:   {}%{}",
                    profile.battery.level,
                    if profile.battery.is_charging {
                        " (charging)"
                    } else {
                        ""
                    }
                );
                println!("Locked:    {}", yes_no(profile.state.is_locked));
                println!("Awake:     {}", yes_no(profile.state.is_awake));
                println!("Packages:  {}", profile.packages.count);
            }
            return Ok(true);
        }
        Command::Packages => {
            let packages = connector.packages().await?;
            if json {
                print_json(&packages)?;
            } else {
                for package in &packages.list {
                    println!("{}", package);
                }
                println!("{}", "-".repeat(50));
                println!("{} packages", packages.count);
            }
            return Ok(true);
        }
        Command::Screenshot => connector.screenshot().await?,
        Command::Power => connector.power_button().await?,
        Command::Volume { direction, times } => match direction {
            Direction::Up => connector.volume_up(times).await?,
            Direction::Down => connector.volume_down(times).await?,
        },
        Command::Brightness { direction, times } => match direction {
            Direction::Up => connector.brightness_up(times).await?,
            Direction::Down => connector.brightness_down(times).await?,
        },
        Command::Text { text } => connector.insert_text(&text).await?,
        Command::Tap { x, y } => connector.tap(x, y).await?,
        Command::Swipe {
            x1,
            y1,
            x2,
            y2,
            duration,
        } => connector.swipe((x1, y1), (x2, y2), duration).await?,
        Command::OpenApp { name } => connector.open_app(&name).await?,
        Command::Navigate { action } => connector.navigate(&action).await?,
        Command::VoiceAssistant => connector.voice_assistant().await?,
        Command::Call { number } => connector.call(&number).await?,
        Command::Sms { number, message } => connector.send_sms(&number, &message).await?,
        Command::Camera { video, front } => {
            let mode = if video {
                CaptureMode::Video
            } else {
                CaptureMode::Photo
            };
            connector.open_camera(mode, facing(front)).await?
        }
        Command::Photo { capture } => connector.take_picture(capture.options()).await?,
        Command::Video { capture, duration } => {
            connector
                .video_capture(capture.options(), duration)
                .await?
        }
        Command::Unlock { password } => connector.unlock_screen(password.as_deref()).await?,
        Command::Gestures { file } => {
            let json_text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let sequence = GestureSequence::from_json(&json_text)?;
            let report = connector.gesture_sequence(sequence).await?;
            return print_report(&report, json);
        }
        Command::MultiTap { x, y, times, delay } => {
            let report = connector.multi_tap(x, y, times, delay).await?;
            return print_report(&report, json);
        }
        Command::Install { apk } => connector.install_apk(&apk).await?,
        Command::Uninstall { package } => connector.uninstall_apk(&package).await?,
        Command::Logcat { term } => {
            connector.start_logcat(term.as_deref()).await?;
            return Ok(true);
        }
        Command::Reboot { countdown } => connector.reboot(countdown).await?,
        Command::TurnOff { countdown } => connector.turn_off(countdown).await?,
        Command::ListApps => {
            print_supported(json)?;
            return Ok(true);
        }
    };

    print_result(&result, json)?;
    Ok(result.success)
}

fn print_result(result: &ActionResult, json: bool) -> Result<()> {
    if json {
        return print_json(result);
    }
    let icon = if result.success { "\u{2705}" } else { "\u{274C}" };
    let status = if result.success { "OK" } else { "FAILED" };
    match &result.message {
        Some(message) => println!("{} {} ({})", icon, status, message),
        None => println!("{} {}", icon, status),
    }
    Ok(())
}

fn print_report(report: &SequenceReport, json: bool) -> Result<bool> {
    if json {
        print_json(report)?;
    } else {
        for (i, step) in report.steps.iter().enumerate() {
            let icon = if step.success { "\u{2713}" } else { "\u{2717}" };
            println!("  {} step {}", icon, i + 1);
        }
        println!("{}", "-".repeat(50));
        println!(
            "{}/{} steps succeeded",
            report.succeeded(),
            report.steps.len()
        );
    }
    Ok(report.all_succeeded())
}

fn print_supported(json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Supported {
        apps: Vec<&'static str>,
        navigation: Vec<&'static str>,
    }

    let supported = Supported {
        apps: list_supported_apps(),
        navigation: list_navigation_actions(),
    };
    if json {
        return print_json(&supported);
    }

    println!("Supported apps:");
    for app in &supported.apps {
        println!("  - {}", app);
    }
    println!("\nNavigation actions:");
    for action in &supported.navigation {
        println!("  - {}", action);
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_raw(output: &str) {
    let trimmed = output.trim();
    if !trimmed.is_empty() {
        println!("{}", trimmed);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_apps_needs_no_device() {
        let cli = Cli::parse_from(["adbc", "--json", "list-apps"]);
        assert!(matches!(cli.command, Command::ListApps));
        assert!(run(cli).await.unwrap());
    }

    #[test]
    fn test_capture_args_build_options() {
        let cli = Cli::parse_from(["adbc", "photo", "--front", "--zoom-in", "2"]);
        match cli.command {
            Command::Photo { capture } => {
                let options = capture.options();
                assert_eq!(options.facing, CameraFacing::Front);
                assert_eq!(options.zoom_in, 2);
                assert_eq!(options.zoom_out, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

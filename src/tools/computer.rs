//! Screen and input control capability for a virtual X display.
//!
//! Shells out to `xdotool` for keyboard/mouse actions and `scrot` for
//! screenshots. The display is a single shared resource, so invocations
//! are serialized behind an internal mutex.

use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tokio::process::Command;
use tokio::sync::Mutex;

use super::{Tool, ToolExecutionResult};

const DISPLAY_WIDTH_PX: u32 = 1024;
const DISPLAY_HEIGHT_PX: u32 = 768;
const TYPING_DELAY_MS: u32 = 12;

pub struct ComputerTool {
    display: String,
    lock: Mutex<()>,
}

impl ComputerTool {
    pub fn new() -> Self {
        Self::on_display(1)
    }

    pub fn on_display(display_num: u32) -> Self {
        Self {
            display: format!(":{display_num}"),
            lock: Mutex::new(()),
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> ToolExecutionResult {
        let output = Command::new(program)
            .args(args)
            .env("DISPLAY", &self.display)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                ToolExecutionResult::ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => ToolExecutionResult::err(format!(
                "{program} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(err) => ToolExecutionResult::err(format!("cannot run {program}: {err}")),
        }
    }

    async fn screenshot(&self) -> ToolExecutionResult {
        let file = match tempfile::Builder::new().suffix(".png").tempfile() {
            Ok(file) => file,
            Err(err) => return ToolExecutionResult::err(format!("cannot create temp file: {err}")),
        };
        let path = file.path().to_string_lossy().into_owned();

        // -o: allow overwriting the just-created temp file
        let shot = self.run("scrot", &["-o", &path]).await;
        if shot.is_error() {
            return shot;
        }

        match tokio::fs::read(file.path()).await {
            Ok(bytes) => ToolExecutionResult {
                base64_image: Some(BASE64.encode(bytes)),
                ..Default::default()
            },
            Err(err) => ToolExecutionResult::err(format!("cannot read screenshot: {err}")),
        }
    }
}

impl Default for ComputerTool {
    fn default() -> Self {
        Self::new()
    }
}

fn coordinate(input: &Value) -> Option<(i64, i64)> {
    let coords = input["coordinate"].as_array()?;
    Some((coords.first()?.as_i64()?, coords.get(1)?.as_i64()?))
}

#[async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &str {
        "computer"
    }

    fn description(&self) -> &str {
        "Control the screen, keyboard and mouse of the virtual display"
    }

    fn spec(&self) -> Value {
        json!({
            "type": "computer_20241022",
            "name": "computer",
            "display_width_px": DISPLAY_WIDTH_PX,
            "display_height_px": DISPLAY_HEIGHT_PX,
            "display_number": 0,
        })
    }

    async fn invoke(&self, input: Value) -> ToolExecutionResult {
        let Some(action) = input["action"].as_str() else {
            return ToolExecutionResult::err("missing 'action' argument");
        };

        let _guard = self.lock.lock().await;
        tracing::debug!(action, "computer action");

        match action {
            "screenshot" => self.screenshot().await,
            "key" => match input["text"].as_str() {
                Some(text) => self.run("xdotool", &["key", "--", text]).await,
                None => ToolExecutionResult::err("'key' requires 'text'"),
            },
            "type" => match input["text"].as_str() {
                Some(text) => {
                    let delay = TYPING_DELAY_MS.to_string();
                    self.run("xdotool", &["type", "--delay", &delay, "--", text])
                        .await
                }
                None => ToolExecutionResult::err("'type' requires 'text'"),
            },
            "mouse_move" => match coordinate(&input) {
                Some((x, y)) => {
                    self.run("xdotool", &["mousemove", &x.to_string(), &y.to_string()])
                        .await
                }
                None => ToolExecutionResult::err("'mouse_move' requires 'coordinate'"),
            },
            "left_click" => self.run("xdotool", &["click", "1"]).await,
            "middle_click" => self.run("xdotool", &["click", "2"]).await,
            "right_click" => self.run("xdotool", &["click", "3"]).await,
            "double_click" => {
                self.run("xdotool", &["click", "--repeat", "2", "--delay", "300", "1"])
                    .await
            }
            "cursor_position" => self.run("xdotool", &["getmouselocation"]).await,
            other => ToolExecutionResult::err(format!("unrecognized action: {other}")),
        }
    }
}

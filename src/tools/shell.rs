//! Shell command execution capability.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{Tool, ToolExecutionResult};

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MAX_OUTPUT_BYTES: usize = 16_384;

/// Run shell commands via `sh -c`, one process per invocation.
pub struct BashTool {
    timeout: Duration,
}

impl BashTool {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for BashTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its output"
    }

    fn spec(&self) -> Value {
        json!({
            "type": "bash_20241022",
            "name": "bash",
        })
    }

    async fn invoke(&self, input: Value) -> ToolExecutionResult {
        let Some(command) = input["command"].as_str() else {
            return ToolExecutionResult::err("missing 'command' argument");
        };

        tracing::debug!(command, "running shell command");

        let spawned = tokio::time::timeout(
            self.timeout,
            Command::new("sh")
                .arg("-c")
                .arg(command)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output(),
        )
        .await;

        let output = match spawned {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return ToolExecutionResult::err(format!("failed to spawn command: {err}"));
            }
            Err(_) => {
                return ToolExecutionResult::err(format!(
                    "command timed out after {} seconds",
                    self.timeout.as_secs()
                ));
            }
        };

        let stdout = truncate(String::from_utf8_lossy(&output.stdout).into_owned());
        let stderr = truncate(String::from_utf8_lossy(&output.stderr).into_owned());

        if output.status.success() {
            let mut text = stdout;
            if !stderr.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&stderr);
            }
            ToolExecutionResult::ok(text)
        } else {
            let code = output.status.code().unwrap_or(-1);
            let mut error = format!("exit code {code}");
            if !stderr.is_empty() {
                error.push('\n');
                error.push_str(&stderr);
            }
            if !stdout.is_empty() {
                error.push('\n');
                error.push_str(&stdout);
            }
            ToolExecutionResult::err(error)
        }
    }
}

fn truncate(mut s: String) -> String {
    if s.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("\n... [output truncated]");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_a_command() {
        let tool = BashTool::new();
        let result = tool.invoke(json!({"command": "echo hello"})).await;
        assert!(!result.is_error());
        assert_eq!(result.output.as_deref(), Some("hello\n"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error_result() {
        let tool = BashTool::new();
        let result = tool
            .invoke(json!({"command": "echo oops >&2; exit 3"}))
            .await;
        assert!(result.is_error());
        let error = result.error.unwrap();
        assert!(error.contains("exit code 3"));
        assert!(error.contains("oops"));
    }

    #[tokio::test]
    async fn missing_command_argument() {
        let tool = BashTool::new();
        let result = tool.invoke(json!({})).await;
        assert_eq!(result.error.as_deref(), Some("missing 'command' argument"));
    }

    #[tokio::test]
    async fn timeout_is_an_error_result() {
        let tool = BashTool::with_timeout(Duration::from_millis(50));
        let result = tool.invoke(json!({"command": "sleep 5"})).await;
        assert!(result.is_error());
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[test]
    fn truncate_caps_output() {
        let long = "x".repeat(MAX_OUTPUT_BYTES + 100);
        let out = truncate(long);
        assert!(out.len() <= MAX_OUTPUT_BYTES + 32);
        assert!(out.ends_with("[output truncated]"));
    }

    #[test]
    fn spec_names_the_tool() {
        let tool = BashTool::new();
        assert_eq!(tool.spec()["name"], "bash");
        assert_eq!(tool.name(), "bash");
    }
}

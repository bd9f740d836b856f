// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::SandboxGateway;
use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, Tool, ToolCall, ToolExecutionError, ToolOutput};

/// Thin adapter over [`SandboxGateway::exec_command`]. The gateway is
/// expected to return `data: {"stdout", "stderr", "exit_code"}`; everything
/// below is output shaping, not process management — the sandbox runtime
/// itself lives outside this crate.
pub struct ShellTool {
    gateway: Arc<dyn SandboxGateway>,
    session: String,
}

impl ShellTool {
    pub fn new(gateway: Arc<dyn SandboxGateway>, session: impl Into<String>) -> Self {
        Self { gateway, session: session.into() }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the sandbox session and return stdout + stderr.\n\
         'shell_command' is required and may be any bash one-liner.\n\
         Prefer non-interactive commands; output is capped and truncated from the\n\
         head and tail when it runs long, so both the command preamble and the\n\
         final result remain visible."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "shell_command": {
                    "type": "string",
                    "description": "The complete bash one liner shell command to execute."
                },
                "workdir": {
                    "type": "string",
                    "description": "Working directory (optional, defaults to the session root)"
                }
            },
            "required": ["shell_command"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Ask
    }

    fn output_category(&self) -> OutputCategory {
        OutputCategory::HeadTail
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
        let command = match call.args.get("shell_command").and_then(|v| v.as_str()) {
            Some(c) => c,
            None => {
                return Ok(ToolOutput::err(
                    &call.id,
                    "Please provide a shell command as the 'shell_command' parameter.",
                ));
            }
        };
        let workdir = call.args.get("workdir").and_then(|v| v.as_str()).unwrap_or(".");

        let result = self.gateway.exec_command(&self.session, workdir, command).await;
        if !result.success {
            return Err(ToolExecutionError::Transport(
                result.error.unwrap_or_else(|| "exec_command failed".into()),
            ));
        }

        let stdout = result.data.get("stdout").and_then(|v| v.as_str()).unwrap_or("");
        let stderr = result.data.get("stderr").and_then(|v| v.as_str()).unwrap_or("");
        let exit_code = result.data.get("exit_code").and_then(|v| v.as_i64()).unwrap_or(0);

        let mut content = String::new();
        if !stdout.is_empty() {
            content.push_str(stdout);
        }
        if !stderr.is_empty() {
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str("[stderr]\n");
            content.push_str(stderr);
        }
        if content.is_empty() {
            content = format!("[exit {exit_code}]");
        }

        Ok(match exit_code {
            0 => ToolOutput::ok(&call.id, content),
            // Exit code 1 is the Unix convention for "no matches" (grep/rg) or
            // "condition false" (test/[) — not a command failure.
            1 => ToolOutput::ok(&call.id, format!("[exit 1]\n{content}")),
            code => ToolOutput::err(&call.id, format!("[exit {code}]\n{content}")),
        })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::SandboxGateway;
use crate::policy::ApprovalPolicy;
use crate::tool::{Tool, ToolCall, ToolExecutionError, ToolOutput};

/// Thin passthrough over the sandbox's remote-access descriptors
/// (`get_cdp_url`/`get_vnc_url`/`get_code_server_url`). The tool never drives
/// a browser itself — it hands the model a URL it can act on or report back
/// to the user.
pub struct BrowserTool {
    gateway: Arc<dyn SandboxGateway>,
    session: String,
}

impl BrowserTool {
    pub fn new(gateway: Arc<dyn SandboxGateway>, session: impl Into<String>) -> Self {
        Self { gateway, session: session.into() }
    }
}

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        "browser"
    }

    fn description(&self) -> &str {
        "Fetch a connection descriptor for the sandbox's browser, VNC display, or \
         code-server instance. Set 'target' to one of: cdp, vnc, code_server."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "target": {
                    "type": "string",
                    "enum": ["cdp", "vnc", "code_server"],
                    "description": "Which remote-access descriptor to fetch"
                }
            },
            "required": ["target"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
        let target = match call.args.get("target").and_then(|v| v.as_str()) {
            Some(t) => t,
            None => return Ok(ToolOutput::err(&call.id, "missing 'target'")),
        };

        let result = match target {
            "cdp" => self.gateway.get_cdp_url(&self.session).await,
            "vnc" => self.gateway.get_vnc_url(&self.session).await,
            "code_server" => self.gateway.get_code_server_url(&self.session).await,
            other => return Ok(ToolOutput::err(&call.id, format!("unknown target: {other}"))),
        };

        if !result.success {
            return Err(ToolExecutionError::Transport(
                result.error.unwrap_or_else(|| format!("{target} url unavailable")),
            ));
        }

        let url = match result.data {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(ToolOutput::ok(&call.id, url))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

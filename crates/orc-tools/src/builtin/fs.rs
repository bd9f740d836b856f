// SPDX-License-Identifier: MIT
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::SandboxGateway;
use crate::policy::ApprovalPolicy;
use crate::tool::{OutputCategory, Tool, ToolCall, ToolExecutionError, ToolOutput};

/// Thin adapter over the file-oriented half of [`SandboxGateway`]
/// (read/write/replace/search/find/exists/delete/list). Upload and download
/// are exposed as distinct gateway operations but are not wired into this
/// single-tool schema, since the Base Agent Loop has no byte-payload
/// argument channel; a dedicated transfer tool can call the gateway
/// directly when that need arises.
pub struct FileTool {
    gateway: Arc<dyn SandboxGateway>,
    session: String,
}

impl FileTool {
    pub fn new(gateway: Arc<dyn SandboxGateway>, session: impl Into<String>) -> Self {
        Self { gateway, session: session.into() }
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        "file"
    }

    fn description(&self) -> &str {
        "Read, write, replace, search, find, check, delete, or list files in the \
         sandbox session. Set 'operation' to one of: read, write, replace, search, \
         find, exists, delete, list."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["read", "write", "replace", "search", "find", "exists", "delete", "list"],
                    "description": "File operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "File or directory path"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (required for write)"
                },
                "find": {
                    "type": "string",
                    "description": "Text or pattern to locate (required for replace/search/find)"
                },
                "replace": {
                    "type": "string",
                    "description": "Replacement text (required for replace)"
                }
            },
            "required": ["operation", "path"],
            "additionalProperties": false
        })
    }

    fn default_policy(&self) -> ApprovalPolicy {
        ApprovalPolicy::Auto
    }

    fn output_category(&self) -> OutputCategory {
        OutputCategory::FileContent
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolExecutionError> {
        let op = match call.args.get("operation").and_then(|v| v.as_str()) {
            Some(o) => o,
            None => return Ok(ToolOutput::err(&call.id, "missing 'operation'")),
        };
        let path = match call.args.get("path").and_then(|v| v.as_str()) {
            Some(p) => p,
            None => return Ok(ToolOutput::err(&call.id, "missing 'path'")),
        };
        let arg = |key: &str| call.args.get(key).and_then(|v| v.as_str()).unwrap_or("");

        let result = match op {
            "read" => self.gateway.file_read(&self.session, path).await,
            "write" => self.gateway.file_write(&self.session, path, arg("content")).await,
            "replace" => {
                self.gateway
                    .file_replace(&self.session, path, arg("find"), arg("replace"))
                    .await
            }
            "search" => self.gateway.file_search(&self.session, path, arg("find")).await,
            "find" => self.gateway.file_find(&self.session, path, arg("find")).await,
            "exists" => self.gateway.file_exists(&self.session, path).await,
            "delete" => self.gateway.file_delete(&self.session, path).await,
            "list" => self.gateway.file_list(&self.session, path).await,
            other => return Ok(ToolOutput::err(&call.id, format!("unknown operation: {other}"))),
        };

        if !result.success {
            return match result.error {
                Some(msg) if op == "exists" => Ok(ToolOutput::ok(&call.id, format!("false: {msg}"))),
                Some(msg) => Err(ToolExecutionError::Transport(msg)),
                None => Err(ToolExecutionError::Transport(format!("{op} failed"))),
            };
        }

        let text = match result.data {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(ToolOutput::ok(&call.id, text))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::Value;

/// Uniform return type of every sandbox gateway operation (§6).
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: Value::Null, error: Some(msg.into()) }
    }
}

/// The sandbox runtime boundary (§6). The runtime itself — the actual
/// container, shell, and filesystem a session drives — is out of scope;
/// this trait is the contract the built-in tools in [`crate::builtin`] call
/// through. A real implementation lives in whatever process hosts the
/// sandbox; tests use an in-memory fake.
#[async_trait]
pub trait SandboxGateway: Send + Sync {
    async fn exec_command(&self, session: &str, cwd: &str, cmd: &str) -> ToolResult;
    async fn view_shell(&self, session: &str, shell_id: &str) -> ToolResult;
    async fn wait_for_process(&self, session: &str, shell_id: &str, seconds: f64) -> ToolResult;
    async fn write_to_process(&self, session: &str, shell_id: &str, input: &str) -> ToolResult;
    async fn kill_process(&self, session: &str, shell_id: &str) -> ToolResult;

    async fn file_read(&self, session: &str, path: &str) -> ToolResult;
    async fn file_write(&self, session: &str, path: &str, content: &str) -> ToolResult;
    async fn file_replace(&self, session: &str, path: &str, find: &str, replace: &str) -> ToolResult;
    async fn file_search(&self, session: &str, path: &str, pattern: &str) -> ToolResult;
    async fn file_find(&self, session: &str, path: &str, name_glob: &str) -> ToolResult;
    async fn file_exists(&self, session: &str, path: &str) -> ToolResult;
    async fn file_delete(&self, session: &str, path: &str) -> ToolResult;
    async fn file_list(&self, session: &str, path: &str) -> ToolResult;
    async fn file_upload(&self, session: &str, path: &str, bytes: &[u8]) -> ToolResult;
    async fn file_download(&self, session: &str, path: &str) -> ToolResult;

    async fn get_status(&self, session: &str) -> ToolResult;
    /// Polls `get_status` up to 5 times, per §6, until the session reports ready.
    async fn ensure_status(&self, session: &str) -> ToolResult {
        let mut last = self.get_status(session).await;
        for _ in 0..5 {
            if last.success {
                return last;
            }
            last = self.get_status(session).await;
        }
        last
    }

    async fn get_cdp_url(&self, session: &str) -> ToolResult;
    async fn get_vnc_url(&self, session: &str) -> ToolResult;
    async fn get_code_server_url(&self, session: &str) -> ToolResult;
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyGateway {
        ready_after: AtomicU32,
    }

    #[async_trait]
    impl SandboxGateway for FlakyGateway {
        async fn exec_command(&self, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn view_shell(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn wait_for_process(&self, _: &str, _: &str, _: f64) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn write_to_process(&self, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn kill_process(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_read(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_write(&self, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_replace(&self, _: &str, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_search(&self, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_find(&self, _: &str, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_exists(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_delete(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_list(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_upload(&self, _: &str, _: &str, _: &[u8]) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn file_download(&self, _: &str, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn get_status(&self, _: &str) -> ToolResult {
            let n = self.ready_after.fetch_sub(1, Ordering::SeqCst);
            if n == 0 { ToolResult::ok(serde_json::json!({"ready": true})) } else { ToolResult::err("not ready") }
        }
        async fn get_cdp_url(&self, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn get_vnc_url(&self, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
        async fn get_code_server_url(&self, _: &str) -> ToolResult { ToolResult::ok(Value::Null) }
    }

    #[tokio::test]
    async fn ensure_status_polls_until_ready() {
        let gw = FlakyGateway { ready_after: AtomicU32::new(2) };
        let result = gw.ensure_status("s1").await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn ensure_status_gives_up_after_five_polls() {
        let gw = FlakyGateway { ready_after: AtomicU32::new(99) };
        let result = gw.ensure_status("s1").await;
        assert!(!result.success);
    }

    #[test]
    fn tool_result_ok_has_no_error() {
        let r = ToolResult::ok(serde_json::json!({"a": 1}));
        assert!(r.success);
        assert!(r.error.is_none());
    }

    #[test]
    fn tool_result_err_carries_message() {
        let r = ToolResult::err("boom");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("boom"));
    }
}

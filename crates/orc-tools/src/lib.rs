// SPDX-License-Identifier: MIT
//! Tool catalogue for the orchestration service (§4.2): the `Tool` trait,
//! approval policy engine, retrying/truncating registry, the sandbox
//! gateway boundary, and the built-in tool adapters over it.

pub mod builtin;
pub mod gateway;
pub mod policy;
pub mod registry;
pub mod tool;
pub mod truncate;

pub use gateway::{SandboxGateway, ToolResult};
pub use policy::{ApprovalPolicy, ToolPolicy};
pub use registry::{InvokerConfig, ToolRegistry, ToolSchema};
pub use tool::{OutputCategory, Tool, ToolCall, ToolExecutionError, ToolOutput, ToolOutputPart};
pub use truncate::smart_truncate;

pub use builtin::browser::BrowserTool;
pub use builtin::fs::FileTool;
pub use builtin::search::SearchTool;
pub use builtin::shell::ShellTool;

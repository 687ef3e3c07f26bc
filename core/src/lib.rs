//! # Cloudtools Core
//!
//! The capability contract shared by every cloudtools adapter.
//!
//! A tool is a [`Tool`] definition plus a [`ToolExecutorFn`]. Orchestrators
//! read the definition (name, description, JSON input schema) to pick a tool
//! and call the executor with a JSON argument string. Results come back as a
//! [`ToolResult`]: a JSON payload, or a [`ToolError`] carrying a readable
//! message.
//!
//! Construction-time problems (a missing API key, a missing subscription id)
//! are [`ConfigurationError`]s and are reported while building a tool, never
//! from inside an invocation.
//!
//! ## Example
//!
//! ```
//! use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolFuture};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let tool = Tool::new(
//!     "echo",
//!     "Echo the input back",
//!     json!({"type": "object", "properties": {}, "additionalProperties": false}),
//! );
//! let executor: ToolExecutorFn = Arc::new(|input: String| {
//!     Box::pin(async move {
//!         if input.is_empty() {
//!             Err(ToolError::new("empty input"))
//!         } else {
//!             Ok(input)
//!         }
//!     }) as ToolFuture
//! });
//! assert_eq!(tool.name, "echo");
//! # let _ = executor;
//! ```

pub mod config;
pub mod tool;

pub use config::ConfigurationError;
pub use tool::{
    into_executor_fn, Tool, ToolError, ToolExecutor, ToolExecutorFn, ToolFuture, ToolResult,
};

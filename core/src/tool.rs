//! Tool capability contract
//!
//! Every adapter in this workspace is exposed to an orchestrator as a pair of
//! a [`Tool`] definition (what the orchestrator reads to decide whether to call
//! it) and a [`ToolExecutorFn`] (what it calls).
//!
//! ## Contract
//!
//! - `name` is unique within a registry
//! - `input_schema` is a JSON Schema object; tools run in strict mode and
//!   reject properties the schema does not declare
//! - Executors take the raw JSON argument string and return a [`ToolResult`]
//!
//! A failed invocation is a value: the executor returns `Err(ToolError)` whose
//! message is meant to be read by the orchestrator (or the model behind it).
//! Executors never panic to signal failure, so one bad call cannot abort a
//! batch of calls.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Tool definition advertised to an orchestrator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Tool name (used to identify which tool to call)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: serde_json::Value,
}

impl Tool {
    /// Create a tool definition
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Whether the schema forbids properties it does not declare
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.input_schema.get("additionalProperties") == Some(&serde_json::Value::Bool(false))
    }

    /// Names of the properties declared by the input schema
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.input_schema
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .map(|props| props.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Result from tool execution
///
/// `Ok` carries the JSON-serialized payload, `Err` a human-readable error.
pub type ToolResult = Result<String, ToolError>;

/// Boxed future returned by a [`ToolExecutorFn`]
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Type-erased tool executor
///
/// Takes the JSON argument string. Cloning is cheap (`Arc`), so registries
/// hand out clones and release their locks before awaiting.
pub type ToolExecutorFn = Arc<dyn Fn(String) -> ToolFuture + Send + Sync>;

/// Tool execution error
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    /// Error message
    pub message: String,
}

impl ToolError {
    /// Create an error from any displayable message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Tool executor trait for implementing custom tools
///
/// **Edition 2024**: Uses RPITIT (Return Position Impl Trait In Traits)
pub trait ToolExecutor: Send + Sync {
    /// Execute tool with JSON input string, return result or error
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the tool execution fails
    fn execute(&self, input: &str) -> impl Future<Output = ToolResult> + Send;
}

/// Erase a [`ToolExecutor`] into a [`ToolExecutorFn`]
///
/// The executor is shared between invocations, so it must be `'static`.
#[must_use]
pub fn into_executor_fn<E>(executor: Arc<E>) -> ToolExecutorFn
where
    E: ToolExecutor + 'static,
{
    Arc::new(move |input: String| {
        let executor = Arc::clone(&executor);
        Box::pin(async move { executor.execute(&input).await }) as ToolFuture
    })
}

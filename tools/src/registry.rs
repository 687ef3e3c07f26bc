//! Tool registry for dynamic tool management
//!
//! The registry provides:
//! - Dynamic tool registration (re-registering a name replaces the tool)
//! - Thread-safe tool storage
//! - Tool execution by name, one call or a concurrent batch
//! - Tool listing and introspection

use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One invocation in a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Registered tool name
    pub name: String,
    /// JSON argument string
    pub input: String,
}

impl ToolCall {
    /// Create a call
    #[must_use]
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
        }
    }
}

/// Thread-safe tool registry
///
/// The registry stores tools and their executors, allowing dynamic
/// registration and execution by name.
///
/// ## Example
///
/// ```ignore
/// use cloudtools_tools::registry::ToolRegistry;
/// use cloudtools_tools::resource_search::resource_search_tool;
///
/// let registry = ToolRegistry::new();
/// let (tool, executor) = resource_search_tool(Arc::new(client), ToolConfig::default());
/// registry.register(tool, executor);
///
/// let result = registry
///     .execute(
///         "resource_search",
///         r#"{"resource_type": "Microsoft.Logic", "resource_group_name": "rg-1"}"#.to_string(),
///     )
///     .await;
/// ```
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, (Tool, ToolExecutorFn)>>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_tools())
            .finish()
    }
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a tool with its executor
    ///
    /// If a tool with the same name already exists, it will be replaced
    /// and this method returns `true`. Otherwise, returns `false`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[allow(clippy::expect_used)]
    pub fn register(&self, tool: Tool, executor: ToolExecutorFn) -> bool {
        let mut tools = self
            .tools
            .write()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tracing::debug!(tool = %tool.name, "registering tool");
        tools.insert(tool.name.clone(), (tool, executor)).is_some()
    }

    /// Execute a tool by name
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the tool is not found or execution fails
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[allow(clippy::expect_used)]
    pub async fn execute(&self, name: &str, input: String) -> ToolResult {
        // Get executor (release lock before awaiting)
        let executor = {
            let tools = self
                .tools
                .read()
                .expect("Tool registry lock poisoned - indicates a panic in another thread");
            tools.get(name).map(|(_, executor)| executor.clone())
        };

        match executor {
            Some(executor) => {
                let result = executor(input).await;
                if let Err(e) = &result {
                    tracing::debug!(tool = name, error = %e, "tool returned an error");
                }
                result
            }
            None => Err(ToolError::new(format!("Tool not found: {name}"))),
        }
    }

    /// Execute several calls concurrently
    ///
    /// Results come back in call order. A failing or unknown call yields an
    /// `Err` in its slot without affecting the others.
    pub async fn execute_batch(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        tracing::debug!(calls = calls.len(), "executing tool batch");
        join_all(
            calls
                .into_iter()
                .map(|call| async move { self.execute(&call.name, call.input).await }),
        )
        .await
    }

    /// Get a list of all registered tool names, sorted alphabetically
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn list_tools(&self) -> Vec<String> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all registered tool definitions, sorted by name
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get_tools(&self) -> Vec<Tool> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        let mut tool_list: Vec<Tool> = tools.values().map(|(tool, _)| tool.clone()).collect();
        tool_list.sort_by(|a, b| a.name.cmp(&b.name));
        tool_list
    }

    /// Get a specific tool by name
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.get(name).map(|(tool, _)| tool.clone())
    }

    /// Remove a tool from the registry
    ///
    /// Returns `true` if the tool was removed, `false` if it didn't exist.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn unregister(&self, name: &str) -> bool {
        let mut tools = self
            .tools
            .write()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.remove(name).is_some()
    }

    /// Get the number of registered tools
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn count(&self) -> usize {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use crate::events::events_search_tool;
    use crate::mock::{InMemoryAzure, InMemoryCalendar, StalledSource};
    use crate::resource_search::resource_search_tool;
    use crate::timeout::ToolConfig;
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        let (tool, executor) =
            resource_search_tool(Arc::new(InMemoryAzure::sample()), ToolConfig::default());
        registry.register(tool, executor);
        let (tool, executor) =
            events_search_tool(Arc::new(InMemoryCalendar::sample()), ToolConfig::default());
        registry.register(tool, executor);
        registry
    }

    fn resource_call() -> ToolCall {
        ToolCall::new(
            "resource_search",
            json!({"resource_type": "Microsoft.Logic", "resource_group_name": "rg-integration"})
                .to_string(),
        )
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.count(), 0);
        assert_eq!(ToolRegistry::default().count(), 0);
    }

    #[test]
    fn test_registry_register_replace() {
        let registry = registry();
        assert_eq!(registry.count(), 2);

        let (tool, executor) =
            resource_search_tool(Arc::new(InMemoryAzure::new()), ToolConfig::default());
        let replaced = registry.register(tool, executor);
        assert!(replaced);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_registry_list_and_get() {
        let registry = registry();
        assert_eq!(registry.list_tools(), ["events_search", "resource_search"]);

        let tools = registry.get_tools();
        assert_eq!(tools[0].name, "events_search");
        assert!(tools.iter().all(Tool::is_strict));

        let tool = registry.get_tool("resource_search").expect("should exist");
        assert!(tool.property_names().contains(&"resource_group_name".to_string()));
        assert!(registry.get_tool("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let result = registry()
            .execute("resource_search", resource_call().input)
            .await
            .expect("should succeed");
        let output: serde_json::Value = serde_json::from_str(&result).expect("valid JSON");
        assert_eq!(output.as_array().map(Vec::len), Some(2));
        assert_eq!(output[0]["name"], "la-order-processor");
    }

    #[tokio::test]
    async fn test_registry_execute_not_found() {
        let err = registry()
            .execute("nonexistent", "{}".to_string())
            .await
            .expect_err("should fail");
        assert_eq!(err.message, "Tool not found: nonexistent");
    }

    #[tokio::test]
    async fn test_registry_batch_isolates_failures() {
        let registry = registry();
        let results = registry
            .execute_batch(vec![
                resource_call(),
                ToolCall::new("nonexistent", "{}"),
                ToolCall::new("resource_search", r#"{"resource_group_name": "rg@1"}"#),
                ToolCall::new(
                    "events_search",
                    json!({
                        "start_datetime": "2024-03-04T00:00:00Z",
                        "end_datetime": "2024-03-09T00:00:00Z"
                    })
                    .to_string(),
                ),
            ])
            .await;

        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_err());
        let events: serde_json::Value =
            serde_json::from_str(results[3].as_ref().expect("events")).expect("valid JSON");
        assert_eq!(events.as_array().map(Vec::len), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_batch_runs_concurrently() {
        let registry = ToolRegistry::new();
        let config = ToolConfig::default().with_timeout(Duration::from_secs(5));
        let (tool, executor) = resource_search_tool(Arc::new(StalledSource), config);
        registry.register(tool, executor);

        let start = tokio::time::Instant::now();
        let results = registry
            .execute_batch(vec![resource_call(), resource_call(), resource_call()])
            .await;

        assert!(results.iter().all(Result::is_err));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_registry_unregister() {
        let registry = registry();
        assert!(registry.unregister("events_search"));
        assert_eq!(registry.count(), 1);
        assert!(!registry.unregister("events_search"));
    }
}

//! Tool runner: invoke the cloudtools search tools from the command line
//!
//! ```text
//! tool-runner [--mock] list
//! tool-runner [--mock] <tool-name> '<json input>'
//! tool-runner [--mock] batch '<json array of {"name", "input"}>'
//! ```
//!
//! Without `--mock`, each tool family is registered when its configuration is
//! present (`AZURE_SUBSCRIPTION_ID` for the Azure tools, `EXA_API_KEY` for
//! Exa; Office 365 only needs an Azure CLI login). With `--mock` every tool
//! runs against in-memory data.
//!
//! Results go to stdout as JSON, logs to stderr (`RUST_LOG` controls the filter).

use anyhow::{bail, Context};
use cloudtools_azure::AzureConfig;
use cloudtools_exa::ExaClient;
use cloudtools_office365::GraphConfig;
use cloudtools_tools::mock::{InMemoryAzure, InMemoryCalendar, InMemoryExa};
use cloudtools_tools::{
    events_search_tool, exa_find_similar_tool, exa_search_tool, logic_app_search_tool,
    resource_search_tool, ToolCall, ToolConfig, ToolRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    init_tracing();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mock = match args.iter().position(|a| a == "--mock") {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    };

    let config = ToolConfig::default();
    let registry = if mock {
        mock_registry(config)
    } else {
        live_registry(config)?
    };
    info!(tools = ?registry.list_tools(), mock, "registry ready");

    match args.as_slice() {
        [] => bail!("usage: tool-runner [--mock] list | <tool-name> '<json>' | batch '<json>'"),
        [command] if command == "list" => {
            println!("{}", serde_json::to_string_pretty(&registry.get_tools())?);
        }
        [command, calls] if command == "batch" => {
            let results = run_batch(&registry, parse_batch(calls)?).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        [name, input] => match registry.execute(name, input.clone()).await {
            Ok(output) => println!("{output}"),
            Err(e) => bail!("{name} failed: {e}"),
        },
        _ => bail!("expected a tool name and one JSON argument"),
    }

    Ok(())
}

#[derive(serde::Deserialize)]
struct BatchEntry {
    name: String,
    #[serde(default = "empty_object")]
    input: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Parse a `[{"name": .., "input": {..}}, ..]` batch argument
fn parse_batch(calls: &str) -> anyhow::Result<Vec<ToolCall>> {
    let entries: Vec<BatchEntry> =
        serde_json::from_str(calls).context("batch must be a JSON array of {name, input}")?;
    Ok(entries
        .into_iter()
        .map(|entry| ToolCall::new(entry.name, entry.input.to_string()))
        .collect())
}

/// Run a batch, embedding each output as JSON and each failure as `{"error": ..}`
async fn run_batch(registry: &ToolRegistry, calls: Vec<ToolCall>) -> Vec<serde_json::Value> {
    registry
        .execute_batch(calls)
        .await
        .into_iter()
        .map(|result| match result {
            Ok(output) => {
                serde_json::from_str(&output).unwrap_or(serde_json::Value::String(output))
            }
            Err(e) => serde_json::json!({"error": e.message}),
        })
        .collect()
}

fn mock_registry(config: ToolConfig) -> ToolRegistry {
    let registry = ToolRegistry::new();

    let azure = Arc::new(InMemoryAzure::sample());
    let (tool, executor) = resource_search_tool(Arc::clone(&azure), config);
    registry.register(tool, executor);
    let (tool, executor) = logic_app_search_tool(azure, config);
    registry.register(tool, executor);

    let (tool, executor) = events_search_tool(Arc::new(InMemoryCalendar::sample()), config);
    registry.register(tool, executor);

    let exa = Arc::new(InMemoryExa::sample());
    let (tool, executor) = exa_search_tool(Arc::clone(&exa), config);
    registry.register(tool, executor);
    let (tool, executor) = exa_find_similar_tool(exa, config);
    registry.register(tool, executor);

    registry
}

fn live_registry(config: ToolConfig) -> anyhow::Result<ToolRegistry> {
    let registry = ToolRegistry::new();

    match AzureConfig::from_env() {
        Ok(azure_config) => {
            let client = Arc::new(cloudtools_azure::authenticate(&azure_config));
            let (tool, executor) = resource_search_tool(Arc::clone(&client), config);
            registry.register(tool, executor);
            let (tool, executor) = logic_app_search_tool(client, config);
            registry.register(tool, executor);
        }
        Err(e) => warn!(error = %e, "Azure tools disabled"),
    }

    let graph_config = GraphConfig::from_env().context("invalid Office 365 configuration")?;
    let graph = Arc::new(cloudtools_office365::authenticate(&graph_config));
    let (tool, executor) = events_search_tool(graph, config);
    registry.register(tool, executor);

    match ExaClient::from_env() {
        Ok(client) => {
            let client = Arc::new(client);
            let (tool, executor) = exa_search_tool(Arc::clone(&client), config);
            registry.register(tool, executor);
            let (tool, executor) = exa_find_similar_tool(client, config);
            registry.register(tool, executor);
        }
        Err(e) => warn!(error = %e, "Exa tools disabled"),
    }

    Ok(registry)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tool_runner=info,cloudtools_tools=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_batch() {
        let calls = parse_batch(
            r#"[
                {
                    "name": "resource_search",
                    "input": {"resource_type": "Microsoft.Logic", "resource_group_name": "rg-1"}
                },
                {"name": "exa_search_results_json"}
            ]"#,
        )
        .expect("valid batch");

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "resource_search");
        let input: serde_json::Value =
            serde_json::from_str(&calls[0].input).expect("JSON input");
        assert_eq!(input["resource_group_name"], "rg-1");
        assert_eq!(calls[1].input, "{}");
    }

    #[test]
    fn test_parse_batch_rejects_non_array() {
        let err = parse_batch(r#"{"name": "resource_search"}"#).expect_err("not an array");
        assert!(err.to_string().contains("JSON array"));
        assert!(parse_batch(r#"[{"input": {}}]"#).is_err());
    }

    #[tokio::test]
    async fn test_run_batch_against_mock_registry() {
        let registry = mock_registry(ToolConfig::default());
        assert_eq!(registry.count(), 5);

        let calls = parse_batch(
            &json!([
                {
                    "name": "resource_search",
                    "input": {
                        "resource_type": "Microsoft.Logic",
                        "resource_group_name": "rg-integration"
                    }
                },
                {"name": "nonexistent"},
                {
                    "name": "resource_search",
                    "input": {"resource_type": "Microsoft.Logic", "resource_group_name": "rg@1"}
                }
            ])
            .to_string(),
        )
        .expect("valid batch");
        let results = run_batch(&registry, calls).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_array().map(Vec::len), Some(2));
        assert_eq!(results[1]["error"], "Tool not found: nonexistent");
        assert!(results[2]["error"].as_str().is_some());
    }
}

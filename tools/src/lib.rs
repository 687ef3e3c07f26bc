//! Search tools over Azure, Office 365 and Exa
//!
//! Each tool follows the same contract: validate the JSON input against a
//! strict schema, make the remote call under a timeout, and normalize the
//! response into a JSON array of flat records (cleaned and optionally
//! truncated text, timestamps as `%Y-%m-%dT%H:%M:%S%z`). Failures come back as
//! `Err(ToolError)` strings; nothing is retried.
//!
//! Tools are generic over the capability traits in [`source`], implemented by
//! the real clients and by the in-memory sources in [`mock`].
//!
//! ## Modules
//!
//! - `resource_search`: Azure resources by type and name (`resource_search`)
//! - `logic_app`: Logic Apps workflows (`logic_app_search`)
//! - `events`: Office 365 calendar events (`events_search`)
//! - `exa`: Exa web search (`exa_search_results_json`, `exa_find_similar_results_json`)
//! - `clean`: markup stripping and whitespace collapsing
//! - `normalize`: truncation, time zones, name matching
//! - `schema`: input validation
//! - `timeout`: per-tool configuration and the remote-call timeout
//! - `source`: remote capability traits
//! - `mock`: in-memory sources for tests and demos
//! - `registry`: tool registry for dynamic tool management

pub mod clean;
pub mod error;
pub mod events;
pub mod exa;
pub mod logic_app;
pub mod mock;
pub mod normalize;
pub mod registry;
pub mod resource_search;
pub mod schema;
pub mod source;
pub mod timeout;

pub use cloudtools_core::{Tool, ToolError, ToolExecutorFn, ToolResult};

// Re-export commonly used types
pub use clean::{clean, try_clean, CleanError};
pub use error::SearchError;
pub use events::{events_search_tool, OutputRecord};
pub use exa::{exa_find_similar_tool, exa_search_tool};
pub use logic_app::{logic_app_search_tool, WorkflowRecord};
pub use normalize::{Normalizer, QueryZone};
pub use registry::{ToolCall, ToolRegistry};
pub use resource_search::{resource_search_tool, ResourceRecord};
pub use schema::ValidationError;
pub use source::{EventSource, ExaSource, ResourceSource, WorkflowSource};
pub use timeout::{execute_with_timeout, ToolConfig};

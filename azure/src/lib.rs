//! # Azure client for cloudtools
//!
//! Credential provider and a thin Azure Resource Manager REST client covering
//! what the search tools need: resource groups, the generic resource listing,
//! and Logic Apps workflows.
//!
//! ## Example
//!
//! ```no_run
//! use cloudtools_azure::{authenticate, AzureConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Fails right here if AZURE_SUBSCRIPTION_ID is not set
//!     let config = AzureConfig::from_env()?;
//!
//!     // Uses the Azure CLI login; nothing runs until the first request
//!     let client = authenticate(&config);
//!
//!     let group = client.get_resource_group("rg-1").await?;
//!     let resources = client.list_resources_by_group(&group.name, None).await?;
//!     println!("{} resources", resources.len());
//!     Ok(())
//! }
//! ```
//!
//! Pagination is not followed and nothing is retried; callers get the first
//! page and the first error.

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{authenticate, ResourceManagementClient};
pub use config::AzureConfig;
pub use credential::{AccessToken, AzureCliCredential, StaticTokenCredential, TokenCredential};
pub use error::{AzureError, CredentialError};
pub use types::{GenericResource, ResourceGroup, Workflow, WorkflowProperties};

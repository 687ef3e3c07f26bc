//! # Exa Search API client
//!
//! Rust client for the Exa search API: neural/keyword web search and
//! find-similar, both with page contents.
//!
//! ## Example
//!
//! ```no_run
//! use cloudtools_exa::{ExaClient, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client from EXA_API_KEY environment variable
//!     let client = ExaClient::from_env()?;
//!
//!     let response = client
//!         .search_and_contents(&SearchRequest::new("rust async runtimes", 5))
//!         .await?;
//!
//!     for result in response.results {
//!         println!("{} {}", result.url, result.title.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::ExaClient;
pub use error::ExaError;
pub use types::{
    ContentsOptions, ExaResult, FindSimilarRequest, HighlightsOptions, SearchFilters,
    SearchRequest, SearchResponse,
};

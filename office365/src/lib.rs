//! # Office 365 client for cloudtools
//!
//! A thin Microsoft Graph client covering the calendar view used by the
//! events search tool. Tokens come from the same credentials as the Azure
//! client (`az login` by default).
//!
//! ## Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use cloudtools_office365::{authenticate, GraphConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = authenticate(&GraphConfig::from_env()?);
//!
//!     let start = Utc::now();
//!     let events = client.calendar_view(start, start + Duration::days(7), 10).await?;
//!     for event in events {
//!         println!("{} {}", event.start, event.subject);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::{authenticate, GraphClient, GraphConfig};
pub use error::GraphError;
pub use types::Event;

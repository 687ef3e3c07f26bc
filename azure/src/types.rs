//! Resource Manager payload types
//!
//! Only the fields the tools consume are modelled; everything else in the
//! responses is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A resource group
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Fully qualified id (`/subscriptions/.../resourceGroups/<name>`)
    pub id: String,
    /// Group name
    pub name: String,
    /// Azure region
    pub location: String,
    /// Resource tags
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// A generic resource as returned by the resources listing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenericResource {
    /// Fully qualified id
    pub id: String,
    /// Resource name
    pub name: String,
    /// `Provider.Namespace/type`, e.g. `Microsoft.Logic/workflows`
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Azure region
    #[serde(default)]
    pub location: Option<String>,
    /// Resource kind, where the provider defines one
    #[serde(default)]
    pub kind: Option<String>,
    /// Resource tags
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Creation time (requested through `$expand`)
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    /// Last change time (requested through `$expand`)
    #[serde(default)]
    pub changed_time: Option<DateTime<Utc>>,
}

impl GenericResource {
    /// Whether the resource's type is `filter` or lives under that namespace
    ///
    /// `Microsoft.Logic` matches `Microsoft.Logic/workflows`;
    /// `Microsoft.Logic/workflows` matches only itself. Case-insensitive, like
    /// Resource Manager itself.
    #[must_use]
    pub fn matches_type(&self, filter: &str) -> bool {
        let filter = filter.trim().trim_end_matches('/');
        if filter.is_empty() {
            return true;
        }

        let resource_type = self.resource_type.to_ascii_lowercase();
        let filter = filter.to_ascii_lowercase();
        resource_type == filter
            || resource_type
                .strip_prefix(&filter)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// A Logic Apps workflow
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Fully qualified id
    pub id: String,
    /// Workflow name
    pub name: String,
    /// Azure region
    #[serde(default)]
    pub location: Option<String>,
    /// Resource tags
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Workflow properties
    #[serde(default)]
    pub properties: WorkflowProperties,
}

/// Properties of a Logic Apps workflow
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProperties {
    /// `Enabled`, `Disabled`, ...
    #[serde(default)]
    pub state: Option<String>,
    /// Workflow version id
    #[serde(default)]
    pub version: Option<String>,
    /// Creation time
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    /// Last change time
    #[serde(default)]
    pub changed_time: Option<DateTime<Utc>>,
    /// Workflow definition document
    #[serde(default)]
    pub definition: Option<serde_json::Value>,
}

impl WorkflowProperties {
    /// The `description` declared in the workflow definition, if any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.definition
            .as_ref()?
            .get("description")?
            .as_str()
    }
}

/// One page of a Resource Manager list response
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Continuation link (not followed)
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Resource Manager error envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Resource Manager error body
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

//! Wire types of the external RBAC service

use serde::{Deserialize, Serialize};

/// Attribute filter of a resource definition, e.g. `id equal <uuid>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub key: String,
    pub operation: String,
    pub value: String,
}

/// Scopes a permission grant to concrete resource instances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub attribute_filter: AttributeFilter,
}

/// One ACL entry: a permission plus the resource instances it covers.
/// An empty `resource_definitions` list means the grant is unscoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Access {
    pub permission: String,
    #[serde(default)]
    pub resource_definitions: Vec<ResourceDefinition>,
}

/// Pagination metadata returned by the RBAC service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessMeta {
    pub count: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Paginated principal access response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPage {
    pub meta: AccessMeta,
    pub data: Vec<Access>,
}

impl AccessPage {
    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.meta.offset + self.meta.limit < self.meta.count
    }
}

//! Principal and endpoint context supplied by the boundary layer
//!
//! None of this is persisted. The identity/session collaborator derives the
//! role flags and per-resource grant sets once per call and hands them in.

use super::common::StringUuid;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Endpoint classification, decided once at the boundary from the request
/// path. Passing it explicitly avoids re-deriving roles from path strings
/// inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Admin,
    Approver,
    Requester,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Approver => write!(f, "approver"),
            Self::Requester => write!(f, "requester"),
        }
    }
}

/// Resource table an id filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTable {
    Requests,
    Stages,
    Actions,
    Workflows,
}

impl ResourceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requests => "requests",
            Self::Stages => "stages",
            Self::Actions => "actions",
            Self::Workflows => "workflows",
        }
    }
}

impl std::fmt::Display for ResourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity performing an operation, with role flags and the
/// resource-scoped grants resolved for it.
#[derive(Debug, Clone, Default)]
pub struct PrincipalContext {
    pub username: String,
    pub is_admin: bool,
    pub is_approver: bool,
    /// Ids the principal may act on as an approver, per resource table
    approver_ids: HashMap<ResourceTable, HashSet<StringUuid>>,
    /// Ids the principal owns as a requester, per resource table
    owner_ids: HashMap<ResourceTable, HashSet<StringUuid>>,
}

impl PrincipalContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_admin: true,
            ..Default::default()
        }
    }

    pub fn with_approver_ids(
        mut self,
        table: ResourceTable,
        ids: impl IntoIterator<Item = StringUuid>,
    ) -> Self {
        self.is_approver = true;
        self.approver_ids
            .entry(table)
            .or_default()
            .extend(ids);
        self
    }

    pub fn with_owner_ids(
        mut self,
        table: ResourceTable,
        ids: impl IntoIterator<Item = StringUuid>,
    ) -> Self {
        self.owner_ids.entry(table).or_default().extend(ids);
        self
    }

    /// Grants for the approver role; empty when nothing was granted
    pub fn approver_ids_for(&self, table: ResourceTable) -> HashSet<StringUuid> {
        self.approver_ids.get(&table).cloned().unwrap_or_default()
    }

    /// Ids owned by the principal as requester; empty when nothing matches
    pub fn owner_ids_for(&self, table: ResourceTable) -> HashSet<StringUuid> {
        self.owner_ids.get(&table).cloned().unwrap_or_default()
    }
}

//! External RBAC service integration

pub mod client;
pub mod types;

pub use client::{HttpRbacClient, RbacClient};
pub use types::{Access, AccessMeta, AccessPage, AttributeFilter, ResourceDefinition};

use crate::domain::StringUuid;
use std::collections::HashSet;

/// Permission granting approval rights on a workflow
pub const APPROVE_PERMISSION: &str = "approval:workflows:approve";

/// Prefix shared by all permissions of this application
const APPLICATION_PREFIX: &str = "approval:";

/// Workflow ids a principal may approve, extracted from its ACL entries.
///
/// Only `approval:workflows:approve` grants scoped with an `id equal <uuid>`
/// attribute filter contribute; unscoped or differently-keyed grants are
/// ignored.
pub fn approver_workflow_ids(acls: &[Access]) -> HashSet<StringUuid> {
    acls.iter()
        .filter(|access| access.permission == APPROVE_PERMISSION)
        .flat_map(|access| access.resource_definitions.iter())
        .filter(|def| {
            def.attribute_filter.key == "id" && def.attribute_filter.operation == "equal"
        })
        .filter_map(|def| def.attribute_filter.value.parse().ok())
        .collect()
}

/// Whether the ACL set marks the principal as an approver at all
pub fn is_approver(acls: &[Access]) -> bool {
    acls.iter()
        .any(|access| access.permission.starts_with(APPLICATION_PREFIX))
}

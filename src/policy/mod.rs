//! Centralized authorization policy for core operations
//!
//! Every inbound operation passes through [`AccessPolicy::authorize`] before
//! any service or state machine work happens. The policy answers one
//! question: given the principal's roles and resource-scoped grants, which
//! ids of a resource table may this call touch?

use crate::config::RbacConfig;
use crate::domain::{EndpointKind, PrincipalContext, ResourceTable, StringUuid};
use crate::error::{ApprovalError, Result};
use std::collections::HashSet;

/// Id filter computed for an authorized call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdFilter {
    /// No filtering; every id of the table is visible
    Unfiltered,
    /// Only the listed ids are visible
    Ids(HashSet<StringUuid>),
}

impl IdFilter {
    pub fn allows(&self, id: StringUuid) -> bool {
        match self {
            Self::Unfiltered => true,
            Self::Ids(ids) => ids.contains(&id),
        }
    }

    /// The concrete id set, when there is one
    pub fn ids(&self) -> Option<&HashSet<StringUuid>> {
        match self {
            Self::Unfiltered => None,
            Self::Ids(ids) => Some(ids),
        }
    }
}

/// Role/endpoint decision component
///
/// The RBAC flag is injected at construction; there is no ambient global
/// toggle. With RBAC disabled every principal sees unfiltered resources.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    enabled: bool,
}

impl AccessPolicy {
    pub fn new(config: &RbacConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }

    /// Construct a policy that bypasses all checks. Must be opted into
    /// explicitly; `AccessPolicy::new` keeps whatever the config says.
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Decide whether the principal may use this endpoint at all and, if so,
    /// which ids of `table` it may touch.
    ///
    /// Decision table:
    /// - admin on the admin endpoint: unfiltered
    /// - admin anywhere else: denied (admins must use the admin endpoint)
    /// - approver (non-admin) on the approver endpoint: approver grant set
    /// - non-admin non-approver on the requester endpoint: owner id set
    /// - everything else: denied
    pub fn authorize(
        &self,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
        table: ResourceTable,
    ) -> Result<IdFilter> {
        if !self.enabled {
            return Ok(IdFilter::Unfiltered);
        }

        let filter = match endpoint {
            EndpointKind::Admin if principal.is_admin => IdFilter::Unfiltered,
            EndpointKind::Approver if principal.is_approver && !principal.is_admin => {
                IdFilter::Ids(principal.approver_ids_for(table))
            }
            EndpointKind::Requester if !principal.is_admin && !principal.is_approver => {
                IdFilter::Ids(principal.owner_ids_for(table))
            }
            _ => {
                return Err(ApprovalError::NotAuthorized(format!(
                    "current role cannot access the {} endpoint",
                    endpoint
                )))
            }
        };

        tracing::info!(
            username = %principal.username,
            endpoint = %endpoint,
            table = %table,
            "accessible {} ids: {:?}",
            table,
            filter.ids()
        );

        Ok(filter)
    }
}

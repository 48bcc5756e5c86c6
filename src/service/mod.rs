//! Business logic layer

pub mod action;
pub mod principal;
pub mod request;

pub use action::ActionService;
pub use principal::PrincipalService;
pub use request::RequestService;

use crate::domain::{EndpointKind, PrincipalContext, Request, ResourceTable, StringUuid};
use crate::error::{ApprovalError, Result};
use crate::policy::AccessPolicy;

/// Authorize access to one concrete request.
///
/// Approvers are scoped by workflow (their grants name workflows they may
/// approve); admins and requesters are scoped by request id.
fn authorize_request(
    policy: &AccessPolicy,
    principal: &PrincipalContext,
    endpoint: EndpointKind,
    request: &Request,
) -> Result<()> {
    let (table, resource_id): (ResourceTable, StringUuid) = match endpoint {
        EndpointKind::Approver => (ResourceTable::Workflows, request.workflow_id),
        _ => (ResourceTable::Requests, request.id),
    };

    let filter = policy.authorize(principal, endpoint, table)?;
    if !filter.allows(resource_id) {
        return Err(ApprovalError::NotAuthorized(format!(
            "principal {} has no grant for {} {}",
            principal.username, table, resource_id
        )));
    }

    Ok(())
}

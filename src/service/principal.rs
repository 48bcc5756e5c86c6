//! Principal context resolution
//!
//! Boundary-side collaborator that turns an authenticated identity into the
//! [`PrincipalContext`] the access policy consumes: role flags plus the
//! per-table grant sets. Admins skip the grant lookup, and so does everyone
//! when RBAC is disabled.

use crate::domain::{PrincipalContext, ResourceTable, StringUuid};
use crate::error::Result;
use crate::policy::AccessPolicy;
use crate::rbac::{self, RbacClient};
use crate::repository::{RequestQuery, RequestRepository};
use std::collections::HashSet;
use std::sync::Arc;

pub struct PrincipalService<R: RequestRepository, C: RbacClient> {
    request_repo: Arc<R>,
    rbac_client: Arc<C>,
    policy: AccessPolicy,
}

impl<R: RequestRepository, C: RbacClient> PrincipalService<R, C> {
    pub fn new(request_repo: Arc<R>, rbac_client: Arc<C>, policy: AccessPolicy) -> Self {
        Self {
            request_repo,
            rbac_client,
            policy,
        }
    }

    /// Resolve the grant context for an identity.
    ///
    /// Approvers carry their workflow grants plus the ids of requests living
    /// under those workflows; plain requesters carry the ids of requests
    /// they created.
    pub async fn resolve(&self, username: &str, is_admin: bool) -> Result<PrincipalContext> {
        if is_admin {
            return Ok(PrincipalContext::admin(username));
        }
        if !self.policy.is_enabled() {
            return Ok(PrincipalContext::new(username));
        }

        let acls = self.rbac_client.get_principal_access(username).await?;
        if rbac::is_approver(&acls) {
            let workflow_ids = rbac::approver_workflow_ids(&acls);
            let request_ids = self.requests_under(&workflow_ids).await?;
            return Ok(PrincipalContext::new(username)
                .with_approver_ids(ResourceTable::Requests, request_ids)
                .with_approver_ids(ResourceTable::Workflows, workflow_ids));
        }

        let owned = self.request_repo.find_ids_by_requester(username).await?;
        Ok(PrincipalContext::new(username).with_owner_ids(ResourceTable::Requests, owned))
    }

    async fn requests_under(
        &self,
        workflow_ids: &HashSet<StringUuid>,
    ) -> Result<HashSet<StringUuid>> {
        let query = RequestQuery {
            workflow_ids: Some(workflow_ids.clone()),
            request_ids: None,
        };
        let requests = self.request_repo.list(&query).await?;
        Ok(requests.into_iter().map(|r| r.id).collect())
    }
}

//! Request creation and listing

use crate::domain::{
    CreateRequestInput, EndpointKind, PrincipalContext, Request, RequestListFilters, RequestState,
    ResourceTable, Stage, StageState, StringUuid,
};
use crate::error::{ApprovalError, Result};
use crate::policy::{AccessPolicy, IdFilter};
use crate::rbac::{self, RbacClient};
use crate::repository::{RequestQuery, RequestRepository, WorkflowRepository};
use std::sync::Arc;
use validator::Validate;

pub struct RequestService<R, W, C>
where
    R: RequestRepository,
    W: WorkflowRepository,
    C: RbacClient,
{
    request_repo: Arc<R>,
    workflow_repo: Arc<W>,
    rbac_client: Arc<C>,
    policy: AccessPolicy,
}

impl<R, W, C> RequestService<R, W, C>
where
    R: RequestRepository,
    W: WorkflowRepository,
    C: RbacClient,
{
    pub fn new(
        request_repo: Arc<R>,
        workflow_repo: Arc<W>,
        rbac_client: Arc<C>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            request_repo,
            workflow_repo,
            rbac_client,
            policy,
        }
    }

    /// Create a request and its stage sequence from a workflow.
    ///
    /// Stages start pending with contiguous 1-based sequences; when the
    /// workflow's template says so, the first stage advances straight to
    /// notified.
    pub async fn create(
        &self,
        workflow_id: StringUuid,
        input: CreateRequestInput,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Request> {
        self.policy
            .authorize(principal, endpoint, ResourceTable::Requests)?;

        input.validate()?;
        if !input.content.is_object() {
            return Err(ApprovalError::Validation(
                "content must be a JSON object".to_string(),
            ));
        }

        let workflow = self
            .workflow_repo
            .find_by_id(workflow_id)
            .await?
            .ok_or_else(|| {
                ApprovalError::NotFound(format!("Workflow {} not found", workflow_id))
            })?;
        if workflow.group_refs.is_empty() {
            return Err(ApprovalError::Validation(format!(
                "workflow {} has no approver groups",
                workflow_id
            )));
        }

        let template = self
            .workflow_repo
            .find_template(workflow.template_id)
            .await?
            .ok_or_else(|| {
                ApprovalError::InternalInconsistency(format!(
                    "workflow {} references missing template {}",
                    workflow_id, workflow.template_id
                ))
            })?;

        let mut request = Request {
            name: input.name,
            description: input.description,
            requester_name: input.requester_name,
            content: input.content,
            workflow_id: workflow.id,
            tenant_id: workflow.tenant_id,
            ..Default::default()
        };

        request.stages = workflow
            .group_refs
            .iter()
            .enumerate()
            .map(|(i, group_ref)| Stage {
                request_id: request.id,
                group_ref: group_ref.clone(),
                sequence: (i + 1) as i32,
                state: StageState::Pending,
                tenant_id: request.tenant_id,
                ..Default::default()
            })
            .collect();

        if template.initial_notify {
            request.stages[0].state = StageState::Notified;
            request.state = RequestState::Notified;
        }

        let created = self.request_repo.create(&request).await?;

        tracing::info!(
            request_id = %created.id,
            workflow_id = %workflow.id,
            stages = created.stages.len(),
            "request created"
        );

        Ok(created)
    }

    /// Fetch one request, stages attached, scoped by the access policy
    pub async fn get(
        &self,
        id: StringUuid,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Request> {
        let request = self
            .request_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(format!("Request {} not found", id)))?;

        super::authorize_request(&self.policy, principal, endpoint, &request)?;
        Ok(request)
    }

    /// List requests with stages eagerly attached.
    ///
    /// The approver filter resolves to the set of workflows that identity
    /// may approve via the external RBAC lookup; lookup failures propagate
    /// as service errors and are never treated as an empty or unfiltered
    /// result.
    pub async fn list(
        &self,
        filters: RequestListFilters,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Vec<Request>> {
        let filter = self
            .policy
            .authorize(principal, endpoint, ResourceTable::Requests)?;

        let mut query = RequestQuery::default();
        if let Some(workflow_id) = filters.workflow_id {
            query.workflow_ids = Some([workflow_id].into());
        }

        if let Some(approver) = &filters.approver {
            let acls = self.rbac_client.get_principal_access(approver).await?;
            let approvable = rbac::approver_workflow_ids(&acls);
            query.workflow_ids = Some(match query.workflow_ids {
                Some(ids) => ids.intersection(&approvable).copied().collect(),
                None => approvable,
            });
        }

        if let IdFilter::Ids(ids) = filter {
            query.request_ids = Some(ids);
        }

        self.request_repo.list(&query).await
    }
}

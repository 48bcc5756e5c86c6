//! Action processing
//!
//! Validates an incoming action against the current stage state, applies the
//! transition plus its cascade, and records the immutable action log entry.

use crate::domain::{
    active_stage, Action, ActionTarget, CreateActionInput, EndpointKind, PrincipalContext,
    Request, StringUuid,
};
use crate::error::{ApprovalError, Result};
use crate::machine;
use crate::policy::AccessPolicy;
use crate::repository::{ActionRepository, RequestRepository};
use std::sync::Arc;
use validator::Validate;

pub struct ActionService<R: RequestRepository, A: ActionRepository> {
    request_repo: Arc<R>,
    action_repo: Arc<A>,
    policy: AccessPolicy,
}

impl<R: RequestRepository, A: ActionRepository> ActionService<R, A> {
    pub fn new(request_repo: Arc<R>, action_repo: Arc<A>, policy: AccessPolicy) -> Self {
        Self {
            request_repo,
            action_repo,
            policy,
        }
    }

    /// Process one action. All validation and authorization happens before
    /// any mutation, so a failure never leaves partial cascade state.
    pub async fn process(
        &self,
        target: ActionTarget,
        input: CreateActionInput,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Action> {
        input.validate()?;

        let request = self.resolve_request(target).await?;
        super::authorize_request(&self.policy, principal, endpoint, &request)?;

        if !request.is_actionable() {
            return Err(ApprovalError::InternalInconsistency(format!(
                "request {} has no actionable stage",
                request.id
            )));
        }

        let target_stage_id = self.resolve_stage_id(target, &request)?;
        let outcome = machine::apply_cascade(&request.stages, target_stage_id, input.operation)?;

        let action = self
            .action_repo
            .record(request.id, request.tenant_id, &outcome, &input)
            .await?;

        tracing::info!(
            request_id = %request.id,
            stage_id = %target_stage_id,
            operation = %input.operation,
            processed_by = %input.processed_by,
            "action recorded"
        );

        Ok(action)
    }

    pub async fn get(
        &self,
        id: StringUuid,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Action> {
        let action = self
            .action_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(format!("Action {} not found", id)))?;

        let request = self
            .request_repo
            .find_by_stage_id(action.stage_id)
            .await?
            .ok_or_else(|| {
                ApprovalError::InternalInconsistency(format!(
                    "action {} references stage {} with no request",
                    action.id, action.stage_id
                ))
            })?;

        super::authorize_request(&self.policy, principal, endpoint, &request)?;
        Ok(action)
    }

    /// The append-only action log of a stage, in creation order
    pub async fn list_for_stage(
        &self,
        stage_id: StringUuid,
        principal: &PrincipalContext,
        endpoint: EndpointKind,
    ) -> Result<Vec<Action>> {
        let request = self
            .request_repo
            .find_by_stage_id(stage_id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(format!("Stage {} not found", stage_id)))?;

        super::authorize_request(&self.policy, principal, endpoint, &request)?;
        self.action_repo.list_by_stage(stage_id).await
    }

    async fn resolve_request(&self, target: ActionTarget) -> Result<Request> {
        match target {
            ActionTarget::Request(id) => self
                .request_repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| ApprovalError::NotFound(format!("Request {} not found", id))),
            ActionTarget::Stage(id) => self
                .request_repo
                .find_by_stage_id(id)
                .await?
                .ok_or_else(|| ApprovalError::NotFound(format!("Stage {} not found", id))),
        }
    }

    fn resolve_stage_id(&self, target: ActionTarget, request: &Request) -> Result<StringUuid> {
        match target {
            ActionTarget::Stage(id) => Ok(id),
            ActionTarget::Request(_) => active_stage(&request.stages).map(|s| s.id).ok_or_else(
                || {
                    ApprovalError::InternalInconsistency(format!(
                        "request {} has no actionable stage",
                        request.id
                    ))
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RbacConfig;
    use crate::domain::{Operation, ResourceTable, Stage, StageState};
    use crate::repository::action::MockActionRepository;
    use crate::repository::request::MockRequestRepository;
    use chrono::Utc;

    fn request_with_stages(states: &[StageState]) -> Request {
        let request_id = StringUuid::new_v4();
        let tenant_id = StringUuid::new_v4();
        let stages = states
            .iter()
            .enumerate()
            .map(|(i, state)| Stage {
                request_id,
                sequence: (i + 1) as i32,
                state: *state,
                tenant_id,
                ..Default::default()
            })
            .collect();

        Request {
            id: request_id,
            workflow_id: StringUuid::new_v4(),
            tenant_id,
            stages,
            ..Default::default()
        }
    }

    fn action_input(operation: Operation) -> CreateActionInput {
        CreateActionInput {
            operation,
            processed_by: "abcd".to_string(),
            comments: None,
        }
    }

    fn policy() -> AccessPolicy {
        AccessPolicy::new(&RbacConfig::default())
    }

    fn service(
        request_repo: MockRequestRepository,
        action_repo: MockActionRepository,
    ) -> ActionService<MockRequestRepository, MockActionRepository> {
        ActionService::new(Arc::new(request_repo), Arc::new(action_repo), policy())
    }

    #[tokio::test]
    async fn test_cancel_on_request_cascades_and_records_action() {
        let request = request_with_stages(&[StageState::Notified, StageState::Pending]);
        let request_id = request.id;
        let tenant_id = request.tenant_id;
        let stage1_id = request.stages[0].id;
        let stage2_id = request.stages[1].id;

        let mut request_repo = MockRequestRepository::new();
        let returned = request.clone();
        request_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(returned.clone())));

        let mut action_repo = MockActionRepository::new();
        action_repo
            .expect_record()
            .withf(move |rid, tid, outcome, input| {
                *rid == request_id
                    && *tid == tenant_id
                    && input.operation == Operation::Cancel
                    && outcome.updates.len() == 2
                    && outcome.updates[0].stage_id == stage1_id
                    && outcome.updates[0].to == StageState::Canceled
                    && outcome.updates[1].stage_id == stage2_id
                    && outcome.updates[1].to == StageState::Skipped
            })
            .returning(|_, tenant_id, outcome, input| {
                Ok(Action {
                    id: StringUuid::new_v4(),
                    stage_id: outcome.target_stage_id,
                    operation: input.operation,
                    processed_by: input.processed_by.clone(),
                    comments: input.comments.clone(),
                    tenant_id,
                    created_at: Utc::now(),
                })
            });

        let principal = PrincipalContext::admin("root");
        let action = service(request_repo, action_repo)
            .process(
                ActionTarget::Request(request_id),
                action_input(Operation::Cancel),
                &principal,
                EndpointKind::Admin,
            )
            .await
            .unwrap();

        assert_eq!(action.operation, Operation::Cancel);
        assert_eq!(action.stage_id, stage1_id);
    }

    #[tokio::test]
    async fn test_action_on_exhausted_request_is_fatal() {
        let request = request_with_stages(&[StageState::Finished, StageState::Finished]);
        let request_id = request.id;
        let stage_id = request.stages[0].id;

        let mut request_repo = MockRequestRepository::new();
        let by_id = request.clone();
        request_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(by_id.clone())));
        let by_stage = request.clone();
        request_repo
            .expect_find_by_stage_id()
            .returning(move |_| Ok(Some(by_stage.clone())));
        let action_repo = MockActionRepository::new();

        let svc = service(request_repo, action_repo);
        let principal = PrincipalContext::admin("root");

        for target in [
            ActionTarget::Request(request_id),
            ActionTarget::Stage(stage_id),
        ] {
            let result = svc
                .process(
                    target,
                    action_input(Operation::Notify),
                    &principal,
                    EndpointKind::Admin,
                )
                .await;

            assert!(matches!(
                result,
                Err(ApprovalError::InternalInconsistency(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_approver_without_grant_is_denied_before_any_mutation() {
        let request = request_with_stages(&[StageState::Notified]);
        let stage_id = request.stages[0].id;

        let mut request_repo = MockRequestRepository::new();
        request_repo
            .expect_find_by_stage_id()
            .returning(move |_| Ok(Some(request.clone())));
        // No record expectation: the mock panics if a mutation is attempted
        let action_repo = MockActionRepository::new();

        let mut principal = PrincipalContext::new("aperson");
        principal.is_approver = true;

        let result = service(request_repo, action_repo)
            .process(
                ActionTarget::Stage(stage_id),
                action_input(Operation::Approve),
                &principal,
                EndpointKind::Approver,
            )
            .await;

        assert!(matches!(result, Err(ApprovalError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_approver_with_workflow_grant_can_act() {
        let request = request_with_stages(&[StageState::Notified, StageState::Pending]);
        let workflow_id = request.workflow_id;
        let stage_id = request.stages[0].id;

        let mut request_repo = MockRequestRepository::new();
        request_repo
            .expect_find_by_stage_id()
            .returning(move |_| Ok(Some(request.clone())));

        let mut action_repo = MockActionRepository::new();
        action_repo
            .expect_record()
            .returning(|_, tenant_id, outcome, input| {
                Ok(Action {
                    id: StringUuid::new_v4(),
                    stage_id: outcome.target_stage_id,
                    operation: input.operation,
                    processed_by: input.processed_by.clone(),
                    comments: input.comments.clone(),
                    tenant_id,
                    created_at: Utc::now(),
                })
            });

        let principal = PrincipalContext::new("aperson")
            .with_approver_ids(ResourceTable::Workflows, [workflow_id]);

        let action = service(request_repo, action_repo)
            .process(
                ActionTarget::Stage(stage_id),
                action_input(Operation::Approve),
                &principal,
                EndpointKind::Approver,
            )
            .await
            .unwrap();

        assert_eq!(action.operation, Operation::Approve);
    }

    #[tokio::test]
    async fn test_targeting_non_active_stage_is_rejected() {
        let request = request_with_stages(&[StageState::Notified, StageState::Pending]);
        let later_stage_id = request.stages[1].id;

        let mut request_repo = MockRequestRepository::new();
        request_repo
            .expect_find_by_stage_id()
            .returning(move |_| Ok(Some(request.clone())));
        let action_repo = MockActionRepository::new();

        let principal = PrincipalContext::admin("root");
        let result = service(request_repo, action_repo)
            .process(
                ActionTarget::Stage(later_stage_id),
                action_input(Operation::Cancel),
                &principal,
                EndpointKind::Admin,
            )
            .await;

        assert!(matches!(
            result,
            Err(ApprovalError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let mut request_repo = MockRequestRepository::new();
        request_repo.expect_find_by_id().returning(|_| Ok(None));
        let action_repo = MockActionRepository::new();

        let principal = PrincipalContext::admin("root");
        let result = service(request_repo, action_repo)
            .process(
                ActionTarget::Request(StringUuid::new_v4()),
                action_input(Operation::Notify),
                &principal,
                EndpointKind::Admin,
            )
            .await;

        assert!(matches!(result, Err(ApprovalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_action_requires_read_grant() {
        let request = request_with_stages(&[StageState::Notified]);
        let stage_id = request.stages[0].id;
        let action = Action {
            id: StringUuid::new_v4(),
            stage_id,
            operation: Operation::Notify,
            processed_by: "system".to_string(),
            comments: None,
            tenant_id: request.tenant_id,
            created_at: Utc::now(),
        };
        let action_id = action.id;

        let mut request_repo = MockRequestRepository::new();
        request_repo
            .expect_find_by_stage_id()
            .returning(move |_| Ok(Some(request.clone())));
        let mut action_repo = MockActionRepository::new();
        action_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(action.clone())));

        let mut principal = PrincipalContext::new("aperson");
        principal.is_approver = true;

        let result = service(request_repo, action_repo)
            .get(action_id, &principal, EndpointKind::Approver)
            .await;

        assert!(matches!(result, Err(ApprovalError::NotAuthorized(_))));
    }
}

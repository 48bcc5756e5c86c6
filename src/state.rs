//! Application state wiring

use crate::config::Config;
use crate::error::Result;
use crate::policy::AccessPolicy;
use crate::rbac::HttpRbacClient;
use crate::repository::action::ActionRepositoryImpl;
use crate::repository::request::RequestRepositoryImpl;
use crate::repository::workflow::WorkflowRepositoryImpl;
use crate::repository;
use crate::service::{ActionService, PrincipalService, RequestService};
use std::sync::Arc;

/// Composition root: connects the pool and wires repositories, the RBAC
/// client, and the access policy into the services.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub principal_service: Arc<PrincipalService<RequestRepositoryImpl, HttpRbacClient>>,
    pub request_service:
        Arc<RequestService<RequestRepositoryImpl, WorkflowRepositoryImpl, HttpRbacClient>>,
    pub action_service: Arc<ActionService<RequestRepositoryImpl, ActionRepositoryImpl>>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let pool = repository::connect(&config.database).await?;

        let request_repo = Arc::new(RequestRepositoryImpl::new(pool.clone()));
        let workflow_repo = Arc::new(WorkflowRepositoryImpl::new(pool.clone()));
        let action_repo = Arc::new(ActionRepositoryImpl::new(pool));

        let policy = AccessPolicy::new(&config.rbac);
        let rbac_client = Arc::new(HttpRbacClient::new(config.rbac.clone())?);

        let principal_service = Arc::new(PrincipalService::new(
            request_repo.clone(),
            rbac_client.clone(),
            policy.clone(),
        ));
        let request_service = Arc::new(RequestService::new(
            request_repo.clone(),
            workflow_repo,
            rbac_client,
            policy.clone(),
        ));
        let action_service = Arc::new(ActionService::new(request_repo, action_repo, policy));

        Ok(Self {
            config,
            principal_service,
            request_service,
            action_service,
        })
    }
}

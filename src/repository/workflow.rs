//! Workflow and template repository

use crate::domain::{StringUuid, Template, Workflow};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Workflow>>;
    async fn find_template(&self, id: StringUuid) -> Result<Option<Template>>;
}

pub struct WorkflowRepositoryImpl {
    pool: MySqlPool,
}

impl WorkflowRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for WorkflowRepositoryImpl {
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Workflow>> {
        let workflow = sqlx::query_as::<_, Workflow>(
            "SELECT id, template_id, name, description, group_refs, tenant_id, created_at \
             FROM workflows WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workflow)
    }

    async fn find_template(&self, id: StringUuid) -> Result<Option<Template>> {
        let template = sqlx::query_as::<_, Template>(
            "SELECT id, title, description, initial_notify, created_at \
             FROM templates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }
}

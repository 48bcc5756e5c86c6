//! Request repository

use crate::domain::{Request, Stage, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::collections::{HashMap, HashSet};

use super::in_placeholders;

/// Query predicate for listing requests. `None` means no constraint; an
/// empty set means nothing matches (and no SQL is issued).
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
    pub workflow_ids: Option<HashSet<StringUuid>>,
    pub request_ids: Option<HashSet<StringUuid>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Insert a request and its stage sequence in one transaction
    async fn create(&self, request: &Request) -> Result<Request>;
    /// Fetch a request with its stages eagerly attached, ordered by sequence
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Request>>;
    /// Fetch the request owning a stage, stages attached
    async fn find_by_stage_id(&self, stage_id: StringUuid) -> Result<Option<Request>>;
    /// List requests matching the query, stages attached
    async fn list(&self, query: &RequestQuery) -> Result<Vec<Request>>;
    /// Ids of all requests created by a requester (the owner id list)
    async fn find_ids_by_requester(&self, requester_name: &str) -> Result<HashSet<StringUuid>>;
}

pub struct RequestRepositoryImpl {
    pool: MySqlPool,
}

impl RequestRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    const SELECT_REQUEST: &'static str = "SELECT id, name, description, requester_name, \
         content, workflow_id, state, decision, tenant_id, created_at FROM requests";

    async fn attach_stages(&self, requests: Vec<Request>) -> Result<Vec<Request>> {
        if requests.is_empty() {
            return Ok(requests);
        }

        let ids: Vec<StringUuid> = requests.iter().map(|r| r.id).collect();
        let sql = format!(
            "SELECT id, request_id, group_ref, sequence, state, tenant_id, created_at \
             FROM stages WHERE request_id IN ({}) ORDER BY sequence",
            in_placeholders(ids.len())
        );

        let mut query = sqlx::query_as::<_, Stage>(&sql);
        for id in &ids {
            query = query.bind(*id);
        }
        let stages = query.fetch_all(&self.pool).await?;

        let mut by_request: HashMap<StringUuid, Vec<Stage>> = HashMap::new();
        for stage in stages {
            by_request.entry(stage.request_id).or_default().push(stage);
        }

        Ok(requests
            .into_iter()
            .map(|mut request| {
                request.stages = by_request.remove(&request.id).unwrap_or_default();
                request
            })
            .collect())
    }
}

#[async_trait]
impl RequestRepository for RequestRepositoryImpl {
    async fn create(&self, request: &Request) -> Result<Request> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO requests
                (id, name, description, requester_name, content, workflow_id,
                 state, decision, tenant_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.requester_name)
        .bind(sqlx::types::Json(&request.content))
        .bind(request.workflow_id)
        .bind(request.state)
        .bind(request.decision)
        .bind(request.tenant_id)
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;

        for stage in &request.stages {
            sqlx::query(
                r#"
                INSERT INTO stages
                    (id, request_id, group_ref, sequence, state, tenant_id, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(stage.id)
            .bind(stage.request_id)
            .bind(&stage.group_ref)
            .bind(stage.sequence)
            .bind(stage.state)
            .bind(stage.tenant_id)
            .bind(stage.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(request.clone())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Request>> {
        let sql = format!("{} WHERE id = ?", Self::SELECT_REQUEST);
        let request = sqlx::query_as::<_, Request>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match request {
            Some(request) => {
                let mut attached = self.attach_stages(vec![request]).await?;
                Ok(attached.pop())
            }
            None => Ok(None),
        }
    }

    async fn find_by_stage_id(&self, stage_id: StringUuid) -> Result<Option<Request>> {
        let sql = format!(
            "{} WHERE id = (SELECT request_id FROM stages WHERE id = ?)",
            Self::SELECT_REQUEST
        );
        let request = sqlx::query_as::<_, Request>(&sql)
            .bind(stage_id)
            .fetch_optional(&self.pool)
            .await?;

        match request {
            Some(request) => {
                let mut attached = self.attach_stages(vec![request]).await?;
                Ok(attached.pop())
            }
            None => Ok(None),
        }
    }

    async fn list(&self, query: &RequestQuery) -> Result<Vec<Request>> {
        // An empty constraint set can never match
        if query.workflow_ids.as_ref().is_some_and(|s| s.is_empty())
            || query.request_ids.as_ref().is_some_and(|s| s.is_empty())
        {
            return Ok(Vec::new());
        }

        let mut sql = format!("{} WHERE 1 = 1", Self::SELECT_REQUEST);
        if let Some(workflow_ids) = &query.workflow_ids {
            sql.push_str(&format!(
                " AND workflow_id IN ({})",
                in_placeholders(workflow_ids.len())
            ));
        }
        if let Some(request_ids) = &query.request_ids {
            sql.push_str(&format!(
                " AND id IN ({})",
                in_placeholders(request_ids.len())
            ));
        }
        sql.push_str(" ORDER BY created_at");

        let mut q = sqlx::query_as::<_, Request>(&sql);
        if let Some(workflow_ids) = &query.workflow_ids {
            for id in workflow_ids {
                q = q.bind(*id);
            }
        }
        if let Some(request_ids) = &query.request_ids {
            for id in request_ids {
                q = q.bind(*id);
            }
        }

        let requests = q.fetch_all(&self.pool).await?;
        self.attach_stages(requests).await
    }

    async fn find_ids_by_requester(&self, requester_name: &str) -> Result<HashSet<StringUuid>> {
        let ids: Vec<StringUuid> =
            sqlx::query_scalar("SELECT id FROM requests WHERE requester_name = ?")
                .bind(requester_name)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().collect())
    }
}

//! Action repository
//!
//! `record` is the single mutation path of the engine: it applies a computed
//! cascade and appends the action row in one transaction. The target stage
//! update carries a `WHERE state = <prior>` guard, so of two concurrent
//! actions racing on the same stage exactly one commits.

use crate::domain::{Action, CreateActionInput, StringUuid};
use crate::error::{ApprovalError, Result};
use crate::machine::{CascadeOutcome, StageUpdate};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Atomically apply a cascade outcome and append its action record
    async fn record(
        &self,
        request_id: StringUuid,
        tenant_id: StringUuid,
        outcome: &CascadeOutcome,
        input: &CreateActionInput,
    ) -> Result<Action>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Action>>;
    /// Actions of a stage in creation order (the append-only log)
    async fn list_by_stage(&self, stage_id: StringUuid) -> Result<Vec<Action>>;
}

pub struct ActionRepositoryImpl {
    pool: MySqlPool,
}

impl ActionRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Classify a state guard that matched no row.
    ///
    /// The first update is the acted-upon stage: losing its guard means a
    /// concurrent action won the race, which is the caller's 400. Any later
    /// update losing its guard means the stored sequence disagrees with the
    /// cascade computed from it.
    fn guard_failure(position: usize, update: &StageUpdate) -> ApprovalError {
        if position == 0 {
            ApprovalError::InvalidStateTransition(format!(
                "stage {} is no longer {}",
                update.stage_id, update.from
            ))
        } else {
            ApprovalError::InternalInconsistency(format!(
                "cascaded stage {} was not in state {}",
                update.stage_id, update.from
            ))
        }
    }
}

#[async_trait]
impl ActionRepository for ActionRepositoryImpl {
    async fn record(
        &self,
        request_id: StringUuid,
        tenant_id: StringUuid,
        outcome: &CascadeOutcome,
        input: &CreateActionInput,
    ) -> Result<Action> {
        let mut tx = self.pool.begin().await?;

        for (position, update) in outcome.updates.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE stages SET state = ? WHERE id = ? AND state = ? AND tenant_id = ?",
            )
            .bind(update.to)
            .bind(update.stage_id)
            .bind(update.from)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(Self::guard_failure(position, update));
            }
        }

        if outcome.request_state.is_some() || outcome.request_decision.is_some() {
            let result = sqlx::query(
                "UPDATE requests SET state = COALESCE(?, state), \
                 decision = COALESCE(?, decision) WHERE id = ? AND tenant_id = ?",
            )
            .bind(outcome.request_state)
            .bind(outcome.request_decision)
            .bind(request_id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                return Err(ApprovalError::InternalInconsistency(format!(
                    "request {} disappeared during action processing",
                    request_id
                )));
            }
        }

        let action = Action {
            id: StringUuid::new_v4(),
            stage_id: outcome.target_stage_id,
            operation: input.operation,
            processed_by: input.processed_by.clone(),
            comments: input.comments.clone(),
            tenant_id,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO actions
                (id, stage_id, operation, processed_by, comments, tenant_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(action.id)
        .bind(action.stage_id)
        .bind(action.operation)
        .bind(&action.processed_by)
        .bind(&action.comments)
        .bind(action.tenant_id)
        .bind(action.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(action)
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Action>> {
        let action = sqlx::query_as::<_, Action>(
            "SELECT id, stage_id, operation, processed_by, comments, tenant_id, created_at \
             FROM actions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(action)
    }

    async fn list_by_stage(&self, stage_id: StringUuid) -> Result<Vec<Action>> {
        let actions = sqlx::query_as::<_, Action>(
            "SELECT id, stage_id, operation, processed_by, comments, tenant_id, created_at \
             FROM actions WHERE stage_id = ? ORDER BY created_at",
        )
        .bind(stage_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(actions)
    }
}

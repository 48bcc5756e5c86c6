//! Action domain types

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Operation applied to a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Notify,
    Approve,
    Deny,
    Cancel,
    Skip,
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "notify" => Ok(Self::Notify),
            "approve" => Ok(Self::Approve),
            "deny" => Ok(Self::Deny),
            "cancel" => Ok(Self::Cancel),
            "skip" => Ok(Self::Skip),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notify => write!(f, "notify"),
            Self::Approve => write!(f, "approve"),
            Self::Deny => write!(f, "deny"),
            Self::Cancel => write!(f, "cancel"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for Operation {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for Operation {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for Operation {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// Action entity
///
/// Immutable record of an operation applied to a stage. Append-only: never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Action {
    pub id: StringUuid,
    pub stage_id: StringUuid,
    pub operation: Operation,
    pub processed_by: String,
    pub comments: Option<String>,
    pub tenant_id: StringUuid,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an action
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateActionInput {
    pub operation: Operation,
    #[validate(length(min = 1, max = 255))]
    pub processed_by: String,
    pub comments: Option<String>,
}

/// Target of an action: a request resolves to its active stage, a stage id
/// is used directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Request(StringUuid),
    Stage(StringUuid),
}

//! Stage domain types

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stage state
///
/// `Pending` and `Notified` are actionable; all other states are terminal
/// and a stage never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    #[default]
    Pending,
    Notified,
    Approved,
    Denied,
    Canceled,
    Skipped,
    Finished,
}

impl StageState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Notified)
    }

    pub fn is_actionable(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::str::FromStr for StageState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "notified" => Ok(Self::Notified),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            "canceled" => Ok(Self::Canceled),
            "skipped" => Ok(Self::Skipped),
            "finished" => Ok(Self::Finished),
            _ => Err(format!("Unknown stage state: {}", s)),
        }
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Notified => write!(f, "notified"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
            Self::Canceled => write!(f, "canceled"),
            Self::Skipped => write!(f, "skipped"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for StageState {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for StageState {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for StageState {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// Stage entity
///
/// One step in a request's approval sequence, owned by exactly one request.
/// `group_ref` is the authorization scope key for the approver group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Stage {
    pub id: StringUuid,
    pub request_id: StringUuid,
    pub group_ref: String,
    /// 1-based position; contiguous and strictly increasing within a request
    pub sequence: i32,
    pub state: StageState,
    pub tenant_id: StringUuid,
    pub created_at: DateTime<Utc>,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            request_id: StringUuid::nil(),
            group_ref: String::new(),
            sequence: 1,
            state: StageState::default(),
            tenant_id: StringUuid::nil(),
            created_at: Utc::now(),
        }
    }
}

/// The active stage of a sequence: the lowest-sequence stage that is still
/// actionable. At most one stage is active at any time.
pub fn active_stage(stages: &[Stage]) -> Option<&Stage> {
    stages
        .iter()
        .filter(|s| s.state.is_actionable())
        .min_by_key(|s| s.sequence)
}

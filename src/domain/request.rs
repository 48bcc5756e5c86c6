//! Request domain types

use super::common::StringUuid;
use super::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Request state, tracking the owning request's position in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Pending,
    Notified,
    Finished,
}

/// Final outcome of a request, undecided until a terminal action lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestDecision {
    #[default]
    Undecided,
    Approved,
    Denied,
    Canceled,
}

impl std::str::FromStr for RequestState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "notified" => Ok(Self::Notified),
            "finished" => Ok(Self::Finished),
            _ => Err(format!("Unknown request state: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Notified => write!(f, "notified"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for RequestState {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for RequestState {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for RequestState {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

impl std::str::FromStr for RequestDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "undecided" => Ok(Self::Undecided),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            "canceled" => Ok(Self::Canceled),
            _ => Err(format!("Unknown request decision: {}", s)),
        }
    }
}

impl std::fmt::Display for RequestDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undecided => write!(f, "undecided"),
            Self::Approved => write!(f, "approved"),
            Self::Denied => write!(f, "denied"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for RequestDecision {
    fn decode(value: sqlx::mysql::MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for RequestDecision {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for RequestDecision {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = self.to_string();
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&s.as_str(), buf)
    }
}

/// Request entity
///
/// Immutable except through stage mutation; the ordered stage sequence is
/// attached eagerly by the repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Request {
    pub id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    pub requester_name: String,
    /// Arbitrary structured payload supplied by the requester
    #[sqlx(json)]
    pub content: serde_json::Value,
    pub workflow_id: StringUuid,
    pub state: RequestState,
    pub decision: RequestDecision,
    pub tenant_id: StringUuid,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub stages: Vec<Stage>,
}

impl Request {
    /// A request is actionable while at least one stage is non-terminal.
    pub fn is_actionable(&self) -> bool {
        self.stages.iter().any(|s| s.state.is_actionable())
    }
}

impl Default for Request {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            description: None,
            requester_name: String::new(),
            content: serde_json::Value::Object(serde_json::Map::new()),
            workflow_id: StringUuid::nil(),
            state: RequestState::default(),
            decision: RequestDecision::default(),
            tenant_id: StringUuid::nil(),
            created_at: Utc::now(),
            stages: Vec::new(),
        }
    }
}

/// Input for creating a request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRequestInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub requester_name: String,
    /// Key-value payload; must be a JSON object
    pub content: serde_json::Value,
}

/// Optional filters for listing requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListFilters {
    pub workflow_id: Option<StringUuid>,
    /// Approver identity; resolved to approvable workflow ids via the
    /// external RBAC lookup
    pub approver: Option<String>,
}

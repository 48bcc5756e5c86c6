//! Workflow and template domain types

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Workflow entity
///
/// Defines the fixed linear approval sequence: one stage is instantiated
/// per entry of `group_refs`, in order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workflow {
    pub id: StringUuid,
    pub template_id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    /// Ordered approver group references, one per stage
    #[sqlx(json)]
    pub group_refs: Vec<String>,
    pub tenant_id: StringUuid,
    pub created_at: DateTime<Utc>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            template_id: StringUuid::nil(),
            name: String::new(),
            description: None,
            group_refs: Vec::new(),
            tenant_id: StringUuid::nil(),
            created_at: Utc::now(),
        }
    }
}

/// Template entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: StringUuid,
    pub title: String,
    pub description: Option<String>,
    /// Whether the first stage of a freshly created request advances
    /// straight to notified
    pub initial_notify: bool,
    pub created_at: DateTime<Utc>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            id: StringUuid::new_v4(),
            title: String::new(),
            description: None,
            initial_notify: true,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_default_initial_notify() {
        let template = Template::default();
        assert!(template.initial_notify);
    }

    #[test]
    fn test_workflow_group_refs_ordered() {
        let workflow = Workflow {
            group_refs: vec!["990".to_string(), "991".to_string()],
            ..Default::default()
        };

        assert_eq!(workflow.group_refs, vec!["990", "991"]);
    }
}

//! Stage state machine
//!
//! Pure transition logic for stages and the cross-stage cascade rules.
//! Nothing here touches persistence: `apply_cascade` returns the full set of
//! state changes an operation causes, and the repository applies them in one
//! transaction.

use crate::domain::{
    active_stage, Operation, RequestDecision, RequestState, Stage, StageState, StringUuid,
};
use crate::error::{ApprovalError, Result};

/// A single stage state change produced by a cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUpdate {
    pub stage_id: StringUuid,
    pub from: StageState,
    pub to: StageState,
}

/// Everything one operation changes: the acted-upon stage, any cascaded
/// stages, and the owning request's state/decision when they move.
///
/// The first update is always the target stage; its `from` state is the
/// guard for the atomic check-and-apply in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub target_stage_id: StringUuid,
    pub updates: Vec<StageUpdate>,
    pub request_state: Option<RequestState>,
    pub request_decision: Option<RequestDecision>,
}

impl CascadeOutcome {
    /// The target stage's state before the operation
    pub fn target_prior_state(&self) -> StageState {
        self.updates[0].from
    }
}

/// Apply one operation to one stage state.
pub fn transition(current: StageState, operation: Operation) -> Result<StageState> {
    use Operation::*;
    use StageState::*;

    let next = match (current, operation) {
        (Pending, Notify) => Notified,
        (Notified, Approve) => Approved,
        (Notified, Deny) => Denied,
        (Pending, Cancel) | (Notified, Cancel) => Canceled,
        (Pending, Skip) => Skipped,
        _ => {
            return Err(ApprovalError::InvalidStateTransition(format!(
                "cannot {} a stage in state {}",
                operation, current
            )))
        }
    };

    Ok(next)
}

/// Compute all state changes caused by applying `operation` to the stage
/// `target_stage_id` of a request with the given stages.
///
/// Only the single active stage (lowest sequence among non-terminal stages)
/// may be targeted. A request with no actionable stage is a state
/// inconsistency, not a client error.
pub fn apply_cascade(
    stages: &[Stage],
    target_stage_id: StringUuid,
    operation: Operation,
) -> Result<CascadeOutcome> {
    let active = active_stage(stages).ok_or_else(|| {
        ApprovalError::InternalInconsistency(
            "request has no actionable stage".to_string(),
        )
    })?;

    if active.id != target_stage_id {
        return Err(ApprovalError::InvalidStateTransition(format!(
            "stage {} is not the active stage of its request",
            target_stage_id
        )));
    }

    let new_state = transition(active.state, operation)?;
    let mut updates = vec![StageUpdate {
        stage_id: active.id,
        from: active.state,
        to: new_state,
    }];

    let mut later: Vec<&Stage> = stages
        .iter()
        .filter(|s| s.sequence > active.sequence)
        .collect();
    later.sort_by_key(|s| s.sequence);

    let (request_state, request_decision) = match operation {
        Operation::Notify => (Some(RequestState::Notified), None),
        Operation::Approve | Operation::Skip => {
            match later.iter().find(|s| s.state.is_actionable()) {
                Some(next) => {
                    // Auto-notify exactly the next stage; anything but a
                    // pending stage here means the sequence is corrupt
                    let notified =
                        transition(next.state, Operation::Notify).map_err(|_| {
                            ApprovalError::InternalInconsistency(format!(
                                "next stage {} is {} but should be pending",
                                next.id, next.state
                            ))
                        })?;
                    updates.push(StageUpdate {
                        stage_id: next.id,
                        from: next.state,
                        to: notified,
                    });
                    (None, None)
                }
                None => {
                    let decision = match operation {
                        Operation::Approve => Some(RequestDecision::Approved),
                        _ => None,
                    };
                    (Some(RequestState::Finished), decision)
                }
            }
        }
        Operation::Deny | Operation::Cancel => {
            for stage in later.iter().filter(|s| s.state.is_actionable()) {
                updates.push(StageUpdate {
                    stage_id: stage.id,
                    from: stage.state,
                    to: StageState::Skipped,
                });
            }
            let decision = match operation {
                Operation::Deny => RequestDecision::Denied,
                _ => RequestDecision::Canceled,
            };
            (Some(RequestState::Finished), Some(decision))
        }
    };

    Ok(CascadeOutcome {
        target_stage_id,
        updates,
        request_state,
        request_decision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn stage(sequence: i32, state: StageState) -> Stage {
        Stage {
            sequence,
            state,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(StageState::Pending, Operation::Notify, StageState::Notified)]
    #[case(StageState::Notified, Operation::Approve, StageState::Approved)]
    #[case(StageState::Notified, Operation::Deny, StageState::Denied)]
    #[case(StageState::Pending, Operation::Cancel, StageState::Canceled)]
    #[case(StageState::Notified, Operation::Cancel, StageState::Canceled)]
    #[case(StageState::Pending, Operation::Skip, StageState::Skipped)]
    fn test_transition_table(
        #[case] from: StageState,
        #[case] operation: Operation,
        #[case] to: StageState,
    ) {
        assert_eq!(transition(from, operation).unwrap(), to);
    }

    #[rstest]
    // notify is only valid from pending
    #[case(StageState::Notified, Operation::Notify)]
    // approve/deny require a notified stage
    #[case(StageState::Pending, Operation::Approve)]
    #[case(StageState::Pending, Operation::Deny)]
    // skip only bypasses a stage nobody was asked about yet
    #[case(StageState::Notified, Operation::Skip)]
    fn test_transition_rejects_invalid(#[case] from: StageState, #[case] operation: Operation) {
        assert!(matches!(
            transition(from, operation),
            Err(ApprovalError::InvalidStateTransition(_))
        ));
    }

    #[rstest]
    fn test_terminal_states_are_final(
        #[values(
            StageState::Approved,
            StageState::Denied,
            StageState::Canceled,
            StageState::Skipped,
            StageState::Finished
        )]
        state: StageState,
        #[values(
            Operation::Notify,
            Operation::Approve,
            Operation::Deny,
            Operation::Cancel,
            Operation::Skip
        )]
        operation: Operation,
    ) {
        assert!(matches!(
            transition(state, operation),
            Err(ApprovalError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_approve_non_final_notifies_exactly_next_stage() {
        let stages = vec![
            stage(1, StageState::Notified),
            stage(2, StageState::Pending),
            stage(3, StageState::Pending),
        ];

        let outcome = apply_cascade(&stages, stages[0].id, Operation::Approve).unwrap();

        assert_eq!(outcome.updates.len(), 2);
        assert_eq!(outcome.updates[0].to, StageState::Approved);
        assert_eq!(outcome.updates[1].stage_id, stages[1].id);
        assert_eq!(outcome.updates[1].to, StageState::Notified);
        assert_eq!(outcome.request_state, None);
        assert_eq!(outcome.request_decision, None);
    }

    #[test]
    fn test_approve_final_stage_finishes_request() {
        let stages = vec![
            stage(1, StageState::Approved),
            stage(2, StageState::Notified),
        ];

        let outcome = apply_cascade(&stages, stages[1].id, Operation::Approve).unwrap();

        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.request_state, Some(RequestState::Finished));
        assert_eq!(outcome.request_decision, Some(RequestDecision::Approved));
    }

    #[test]
    fn test_cancel_skips_all_later_stages() {
        let stages = vec![
            stage(1, StageState::Notified),
            stage(2, StageState::Pending),
            stage(3, StageState::Pending),
        ];

        let outcome = apply_cascade(&stages, stages[0].id, Operation::Cancel).unwrap();

        assert_eq!(outcome.updates[0].to, StageState::Canceled);
        assert_eq!(outcome.updates[1].to, StageState::Skipped);
        assert_eq!(outcome.updates[2].to, StageState::Skipped);
        assert_eq!(outcome.request_state, Some(RequestState::Finished));
        assert_eq!(outcome.request_decision, Some(RequestDecision::Canceled));
    }

    #[test]
    fn test_deny_skips_later_and_records_decision() {
        let stages = vec![
            stage(1, StageState::Approved),
            stage(2, StageState::Notified),
            stage(3, StageState::Pending),
        ];

        let outcome = apply_cascade(&stages, stages[1].id, Operation::Deny).unwrap();

        assert_eq!(outcome.updates[0].to, StageState::Denied);
        assert_eq!(outcome.updates[1].stage_id, stages[2].id);
        assert_eq!(outcome.updates[1].to, StageState::Skipped);
        assert_eq!(outcome.request_decision, Some(RequestDecision::Denied));
    }

    #[test]
    fn test_skip_advances_without_decision() {
        let stages = vec![
            stage(1, StageState::Pending),
            stage(2, StageState::Pending),
        ];

        let outcome = apply_cascade(&stages, stages[0].id, Operation::Skip).unwrap();
        assert_eq!(outcome.updates[0].to, StageState::Skipped);
        assert_eq!(outcome.updates[1].to, StageState::Notified);

        let last = vec![stage(1, StageState::Pending)];
        let outcome = apply_cascade(&last, last[0].id, Operation::Skip).unwrap();
        assert_eq!(outcome.request_state, Some(RequestState::Finished));
        assert_eq!(outcome.request_decision, None);
    }

    #[test]
    fn test_skip_on_notified_stage_is_rejected() {
        let stages = vec![
            stage(1, StageState::Notified),
            stage(2, StageState::Pending),
        ];

        let result = apply_cascade(&stages, stages[0].id, Operation::Skip);
        assert!(matches!(
            result,
            Err(ApprovalError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_notify_marks_request_notified() {
        let stages = vec![stage(1, StageState::Pending), stage(2, StageState::Pending)];

        let outcome = apply_cascade(&stages, stages[0].id, Operation::Notify).unwrap();

        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.updates[0].to, StageState::Notified);
        assert_eq!(outcome.request_state, Some(RequestState::Notified));
    }

    #[test]
    fn test_targeting_non_active_stage_fails() {
        let stages = vec![
            stage(1, StageState::Notified),
            stage(2, StageState::Pending),
        ];

        let result = apply_cascade(&stages, stages[1].id, Operation::Cancel);
        assert!(matches!(
            result,
            Err(ApprovalError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn test_no_actionable_stage_is_fatal() {
        let stages = vec![
            stage(1, StageState::Finished),
            stage(2, StageState::Finished),
        ];

        let result = apply_cascade(&stages, stages[0].id, Operation::Notify);
        assert!(matches!(
            result,
            Err(ApprovalError::InternalInconsistency(_))
        ));
    }

    #[test]
    fn test_failed_transition_changes_nothing() {
        let stages = vec![
            stage(1, StageState::Pending),
            stage(2, StageState::Pending),
        ];

        // approve is invalid from pending; no outcome, no partial cascade
        let result = apply_cascade(&stages, stages[0].id, Operation::Approve);
        assert!(result.is_err());
        assert_eq!(stages[0].state, StageState::Pending);
        assert_eq!(stages[1].state, StageState::Pending);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::StatusValidationError;

/// Pipeline lifecycle states, including the transitional states the service
/// occupies while the orchestrator converges the data plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PipelineStatus {
    Created,
    Running,
    Paused,
    Pausing,
    Resuming,
    Stopping,
    Stopped,
    Terminating,
    Terminated,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Pausing => "Pausing",
            Self::Resuming => "Resuming",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
            Self::Failed => "Failed",
        }
    }

    /// `Stopped` and `Failed` are the only statuses from which deletion is
    /// permitted.
    pub fn is_deletable(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Edits are permitted only when `Stopped`; `Paused` is reserved for
    /// provider-defined cases which this orchestrator-agnostic core does not
    /// implement (see DESIGN.md).
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Requester-initiated actions that drive the state machine. Orchestrator
/// failure reports are modeled separately (`PipelineService::mark_failed`)
/// since they are not requester actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineAction {
    Stop,
    Resume,
    Terminate,
    Delete,
    Edit,
}

impl PipelineAction {
    fn requested_label(&self) -> &'static str {
        match self {
            Self::Stop => "Stopping",
            Self::Resume => "Resuming",
            Self::Terminate => "Terminating",
            Self::Delete => "Deleted",
            Self::Edit => "editing",
        }
    }
}

/// Apply `action` to `current`, returning `(transitional, eventual)` status
/// pair on success. `Delete` and `Edit` are not real status transitions (they
/// gate on the current status instead of producing a new one) so they return
/// the current status unchanged on success.
pub fn transition(
    current: PipelineStatus,
    action: PipelineAction,
) -> Result<(PipelineStatus, PipelineStatus), StatusValidationError> {
    use PipelineAction::*;
    use PipelineStatus::*;

    let reject = |valid: &[PipelineStatus]| StatusValidationError {
        current_status: current.as_str().to_string(),
        requested_status: action.requested_label().to_string(),
        valid_transitions: valid.iter().map(|s| s.as_str().to_string()).collect(),
    };

    match (current, action) {
        (Created, Stop) | (Running, Stop) => Ok((Stopping, Stopped)),
        // Idempotent: a retried Stop while already converging is a success,
        // not a conflict.
        (Stopping, Stop) => Ok((Stopping, Stopped)),

        (Paused, Resume) | (Stopped, Resume) => Ok((Resuming, Running)),
        (Resuming, Resume) => Ok((Resuming, Running)),

        (Running, Terminate) | (Paused, Terminate) | (Stopped, Terminate) => {
            Ok((Terminating, Terminated))
        }
        (Terminating, Terminate) => Ok((Terminating, Terminated)),

        (Stopped, Delete) | (Failed, Delete) => Ok((current, current)),
        (_, Delete) => Err(reject(&[Stopped])),

        (Stopped, Edit) => Ok((current, current)),
        (_, Edit) => Err(reject(&[Stopped])),

        (_, Stop) => Err(reject(&[Created, Running])),
        (_, Resume) => Err(reject(&[Paused, Stopped])),
        (_, Terminate) => Err(reject(&[Running, Paused, Stopped])),
    }
}

/// A data-plane failure can occur from any non-terminal state and always
/// lands on `Failed`, bypassing the requester-action table above.
pub fn mark_failed(current: PipelineStatus) -> Option<PipelineStatus> {
    match current {
        PipelineStatus::Terminated | PipelineStatus::Failed => None,
        _ => Some(PipelineStatus::Failed),
    }
}

//! Connection request state machine
//!
//! ```text
//!            approve            cancel
//!   pending ────────> approved ───────> cancelled
//!      │  reject
//!      ├──────────> rejected
//!      │  reassign
//!      ├──────────> reassigned   (successor request opens as pending)
//!      │  cancel
//!      └──────────> cancelled
//! ```
//!
//! Repeating approve, reject or cancel on a request already in the target
//! status is a no-op. Every other pair outside the table is illegal.

use edubridge_store::{RequestStatus, Role, UserId};
use serde::{Deserialize, Serialize};

/// Event applied to a connection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Admin approves; optional remark lands in `admin_notes`
    Approve {
        /// Remark for the student
        notes: Option<String>,
    },
    /// Admin rejects; the reason lands in `admin_notes` verbatim
    Reject {
        /// Why the request was turned down
        reason: String,
    },
    /// Admin redirects the request to another counselor
    Reassign {
        /// Counselor the successor request is addressed to
        to: UserId,
    },
    /// Student withdraws
    Cancel,
}

impl Event {
    /// Payload-free discriminant
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Approve { .. } => EventKind::Approve,
            Self::Reject { .. } => EventKind::Reject,
            Self::Reassign { .. } => EventKind::Reassign,
            Self::Cancel => EventKind::Cancel,
        }
    }
}

/// Event discriminant used by the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// See [`Event::Approve`]
    Approve,
    /// See [`Event::Reject`]
    Reject,
    /// See [`Event::Reassign`]
    Reassign,
    /// See [`Event::Cancel`]
    Cancel,
}

impl EventKind {
    /// Every event kind
    pub const ALL: [EventKind; 4] = [Self::Approve, Self::Reject, Self::Reassign, Self::Cancel];

    /// Verb form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Reassign => "reassign",
            Self::Cancel => "cancel",
        }
    }

    /// Status the event leads to
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
            Self::Reassign => RequestStatus::Reassigned,
            Self::Cancel => RequestStatus::Cancelled,
        }
    }

    /// Role allowed to raise the event
    #[must_use]
    pub const fn actor_role(&self) -> Role {
        match self {
            Self::Approve | Self::Reject | Self::Reassign => Role::Admin,
            Self::Cancel => Role::Student,
        }
    }

    /// Whether repeating the event on its own target status is harmless
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Reassign)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating an event against a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Write the new status
    Move(RequestStatus),
    /// Request already sits in the event's target status
    Unchanged,
}

/// Rejected (status, event) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {event} a {from} request")]
pub struct IllegalTransition {
    /// Status the request was in
    pub from: RequestStatus,
    /// Event that was refused
    pub event: EventKind,
}

/// Events that move a request out of `from`
#[must_use]
pub fn allowed_events(from: RequestStatus) -> Vec<EventKind> {
    match from {
        RequestStatus::Pending => EventKind::ALL.to_vec(),
        RequestStatus::Approved => vec![EventKind::Cancel],
        RequestStatus::Rejected | RequestStatus::Reassigned | RequestStatus::Cancelled => vec![],
    }
}

/// Validates an event against the current status
pub fn validate_transition(from: RequestStatus, event: EventKind) -> Result<Step, IllegalTransition> {
    if allowed_events(from).contains(&event) {
        Ok(Step::Move(event.target()))
    } else if event.is_idempotent() && event.target() == from {
        Ok(Step::Unchanged)
    } else {
        Err(IllegalTransition { from, event })
    }
}

/// Whether no event can move a request out of `status`
#[inline]
#[must_use]
pub fn is_terminal(status: RequestStatus) -> bool {
    allowed_events(status).is_empty()
}

use super::{uuid_id, UnknownVariant, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

uuid_id!(
    /// Activity log entry identifier
    ActivityId
);

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Student submitted a request
    ConnectionRequested,
    /// Student withdrew a request
    ConnectionCancelled,
    /// Student side of an approval
    ConnectionApproved,
    /// Counselor side of an approval
    StudentAssigned,
    /// Request was turned down
    ConnectionRejected,
    /// Request was redirected to another counselor
    ConnectionReassigned,
    /// Session booked
    SessionScheduled,
    /// Session held
    SessionCompleted,
    /// Session called off
    SessionCancelled,
}

impl ActivityKind {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequested => "connection_requested",
            Self::ConnectionCancelled => "connection_cancelled",
            Self::ConnectionApproved => "connection_approved",
            Self::StudentAssigned => "student_assigned",
            Self::ConnectionRejected => "connection_rejected",
            Self::ConnectionReassigned => "connection_reassigned",
            Self::SessionScheduled => "session_scheduled",
            Self::SessionCompleted => "session_completed",
            Self::SessionCancelled => "session_cancelled",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connection_requested" => Ok(Self::ConnectionRequested),
            "connection_cancelled" => Ok(Self::ConnectionCancelled),
            "connection_approved" => Ok(Self::ConnectionApproved),
            "student_assigned" => Ok(Self::StudentAssigned),
            "connection_rejected" => Ok(Self::ConnectionRejected),
            "connection_reassigned" => Ok(Self::ConnectionReassigned),
            "session_scheduled" => Ok(Self::SessionScheduled),
            "session_completed" => Ok(Self::SessionCompleted),
            "session_cancelled" => Ok(Self::SessionCancelled),
            other => Err(UnknownVariant::new("activity kind", other)),
        }
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a user's activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Entry id
    pub id: ActivityId,
    /// User whose feed holds the entry
    pub user_id: UserId,
    /// What happened
    pub kind: ActivityKind,
    /// Human-readable summary
    pub description: String,
    /// When it happened
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// New entry stamped now
    pub fn new(user_id: UserId, kind: ActivityKind, description: impl Into<String>) -> Self {
        Self {
            id: ActivityId::new(),
            user_id,
            kind,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

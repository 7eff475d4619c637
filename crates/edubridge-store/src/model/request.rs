use super::{uuid_id, UnknownVariant, User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

uuid_id!(
    /// Connection request identifier
    RequestId
);

/// Status of a connection request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for an admin decision
    Pending,
    /// Admin approved; the counselor sees the student
    Approved,
    /// Admin rejected
    Rejected,
    /// Admin redirected the request to another counselor
    Reassigned,
    /// Student withdrew
    Cancelled,
}

impl RequestStatus {
    /// Every status, in lifecycle order
    pub const ALL: [RequestStatus; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Reassigned,
        Self::Cancelled,
    ];

    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Reassigned => "reassigned",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and approved requests count against the one-active-request rule
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "reassigned" => Ok(Self::Reassigned),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("request status", other)),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student's request to be matched with a counselor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounselorRequest {
    /// Request id
    pub id: RequestId,
    /// Student who asked
    pub student_id: UserId,
    /// Counselor the request is addressed to
    pub requested_counselor_id: UserId,
    /// Lifecycle status
    pub status: RequestStatus,
    /// Free-text motivation from the student
    pub request_reason: Option<String>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Time of the last status change
    pub updated_at: DateTime<Utc>,
    /// Set when approved
    pub approved_at: Option<DateTime<Utc>>,
    /// Admin who approved
    pub approved_by: Option<UserId>,
    /// Set when rejected
    pub rejected_at: Option<DateTime<Utc>>,
    /// Admin who rejected
    pub rejected_by: Option<UserId>,
    /// Set when the student withdrew
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Approval remark or rejection reason
    pub admin_notes: Option<String>,
    /// Original request this one was redirected from
    pub reassigned_from: Option<RequestId>,
}

impl CounselorRequest {
    /// Whether the request counts as the student's active request
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Insert payload for a connection request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCounselorRequest {
    /// Student asking
    pub student_id: UserId,
    /// Counselor asked for
    pub requested_counselor_id: UserId,
    /// Free-text motivation
    pub request_reason: Option<String>,
    /// Set on successors opened by a reassign
    pub reassigned_from: Option<RequestId>,
}

impl NewCounselorRequest {
    /// Request from `student_id` for `counselor_id`
    #[must_use]
    pub fn new(student_id: UserId, counselor_id: UserId) -> Self {
        Self {
            student_id,
            requested_counselor_id: counselor_id,
            request_reason: None,
            reassigned_from: None,
        }
    }

    /// With the student's reason
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.request_reason = if reason.trim().is_empty() {
            None
        } else {
            Some(reason)
        };
        self
    }

    /// Materialize as a pending record
    #[must_use]
    pub fn into_request(self, id: RequestId, now: DateTime<Utc>) -> CounselorRequest {
        CounselorRequest {
            id,
            student_id: self.student_id,
            requested_counselor_id: self.requested_counselor_id,
            status: RequestStatus::Pending,
            request_reason: self.request_reason,
            created_at: now,
            updated_at: now,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_by: None,
            cancelled_at: None,
            admin_notes: None,
            reassigned_from: self.reassigned_from,
        }
    }
}

/// Status change written by a conditional update
///
/// The patch carries the decision stamps so every backend records them
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    /// Status to write
    pub status: RequestStatus,
    /// Stamp for `updated_at` and the status-specific timestamp
    pub at: DateTime<Utc>,
    /// User raising the event
    pub actor: UserId,
    /// Replaces `admin_notes` when set
    pub admin_notes: Option<String>,
}

impl StatusPatch {
    /// Patch moving a request to `status`
    #[must_use]
    pub fn new(status: RequestStatus, actor: UserId, at: DateTime<Utc>) -> Self {
        Self {
            status,
            at,
            actor,
            admin_notes: None,
        }
    }

    /// With admin notes (rejection reason, approval remark)
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.admin_notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Write the patch into a record
    pub fn apply(&self, request: &mut CounselorRequest) {
        request.status = self.status;
        request.updated_at = self.at;
        match self.status {
            RequestStatus::Approved => {
                request.approved_at = Some(self.at);
                request.approved_by = Some(self.actor);
            }
            RequestStatus::Rejected => {
                request.rejected_at = Some(self.at);
                request.rejected_by = Some(self.actor);
            }
            RequestStatus::Cancelled => {
                request.cancelled_at = Some(self.at);
            }
            RequestStatus::Pending | RequestStatus::Reassigned => {}
        }
        if let Some(notes) = &self.admin_notes {
            request.admin_notes = Some(notes.clone());
        }
    }
}

/// Approved request joined with the student's user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Approved request
    pub request: CounselorRequest,
    /// Student who made it
    pub student: User,
}

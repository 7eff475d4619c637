//! Dashboard counters
//!
//! All counters derive from [`RequestSummary`], so a student badge, a
//! counselor badge and the admin overview never disagree.

use edubridge_store::{CounselorRequest, RequestStatus, Session, SessionStatus};
use serde::{Deserialize, Serialize};

/// Request counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    /// All requests
    pub total: usize,
    /// Pending
    pub pending: usize,
    /// Approved
    pub approved: usize,
    /// Rejected
    pub rejected: usize,
    /// Closed by a reassign
    pub reassigned: usize,
    /// Withdrawn by the student
    pub cancelled: usize,
}

impl RequestSummary {
    /// Count of one status
    #[must_use]
    pub fn count(&self, status: RequestStatus) -> usize {
        match status {
            RequestStatus::Pending => self.pending,
            RequestStatus::Approved => self.approved,
            RequestStatus::Rejected => self.rejected,
            RequestStatus::Reassigned => self.reassigned,
            RequestStatus::Cancelled => self.cancelled,
        }
    }
}

/// Counters shown to a student
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentStats {
    /// Approved requests
    pub active_connections: usize,
    /// Pending requests
    pub pending_connections: usize,
}

/// Counters shown to a counselor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounselorStats {
    /// Students with an approved request
    pub active_students: usize,
    /// Requests ever addressed to the counselor
    pub total_requests: usize,
    /// Sessions still scheduled
    pub scheduled_sessions: usize,
    /// Sessions completed
    pub completed_sessions: usize,
}

/// Tally requests by status
#[must_use]
pub fn summarize<'a, I>(requests: I) -> RequestSummary
where
    I: IntoIterator<Item = &'a CounselorRequest>,
{
    requests
        .into_iter()
        .fold(RequestSummary::default(), |mut summary, request| {
            summary.total += 1;
            match request.status {
                RequestStatus::Pending => summary.pending += 1,
                RequestStatus::Approved => summary.approved += 1,
                RequestStatus::Rejected => summary.rejected += 1,
                RequestStatus::Reassigned => summary.reassigned += 1,
                RequestStatus::Cancelled => summary.cancelled += 1,
            }
            summary
        })
}

/// Counters for a student's own requests
#[must_use]
pub fn student_stats(requests: &[CounselorRequest]) -> StudentStats {
    let summary = summarize(requests);
    StudentStats {
        active_connections: summary.approved,
        pending_connections: summary.pending,
    }
}

/// Counters for the requests addressed to a counselor and their sessions
#[must_use]
pub fn counselor_stats(requests: &[CounselorRequest], sessions: &[Session]) -> CounselorStats {
    let summary = summarize(requests);
    let sessions_in = |status| sessions.iter().filter(|s| s.status == status).count();
    CounselorStats {
        active_students: summary.approved,
        total_requests: summary.total,
        scheduled_sessions: sessions_in(SessionStatus::Scheduled),
        completed_sessions: sessions_in(SessionStatus::Completed),
    }
}

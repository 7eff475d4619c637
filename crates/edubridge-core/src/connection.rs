//! Connection request lifecycle
//!
//! [`ConnectionService`] owns every status change of a counselor request.
//! Submissions go through the store's atomic "insert unless active" write,
//! and every transition funnels through [`ConnectionService::apply_transition`],
//! which validates against the transition table and then writes with a
//! compare-and-swap on the status it validated.
//!
//! Activity entries are appended after a successful write. A failed append is
//! logged and never fails the lifecycle operation.

use crate::actor::Actor;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::lifecycle::{validate_transition, Event, EventKind, Step};
use crate::stats::{counselor_stats, student_stats, summarize, CounselorStats, RequestSummary, StudentStats};
use chrono::Utc;
use edubridge_store::{
    Activity, ActivityKind, CounselorRequest, NewCounselorRequest, RecordStore, RequestId,
    RequestStatus, Role, RosterEntry, StatusPatch, StoreError, UserId,
};
use std::sync::Arc;

/// Attempts before a transition gives up on a request that keeps moving
const MAX_CAS_ATTEMPTS: usize = 3;

/// Connection request lifecycle over a record store
#[derive(Debug)]
pub struct ConnectionService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ConnectionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + ?Sized> ConnectionService<S> {
    /// Create service over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a request from `student` to `counselor_id`
    ///
    /// # Errors
    /// - `CoreError::Forbidden` unless the actor is a student
    /// - `CoreError::Validation` when the counselor is unknown or unavailable
    /// - `CoreError::Store(StoreError::ActiveRequestExists)` when the student
    ///   already holds a pending or approved request
    pub async fn submit_request(
        &self,
        student: &Actor,
        counselor_id: UserId,
        reason: Option<String>,
    ) -> CoreResult<CounselorRequest> {
        let student = student
            .authorize(&*self.store, Role::Student, "request a counselor")
            .await?;

        let counselor = match self.store.get_counselor(counselor_id).await {
            Ok(c) => c,
            Err(StoreError::NotFound { .. }) => {
                return Err(ValidationError::invalid(
                    "requested_counselor_id",
                    format!("{counselor_id} is not a counselor"),
                )
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        if !counselor.is_available {
            return Err(ValidationError::invalid(
                "requested_counselor_id",
                format!("{} is not accepting students", counselor.display_name()),
            )
            .into());
        }

        let mut new = NewCounselorRequest::new(student.user_id, counselor_id);
        if let Some(reason) = reason {
            new = new.with_reason(reason);
        }

        let request = match self.store.create_request_if_no_active(new).await {
            Ok(request) => request,
            Err(e @ StoreError::ActiveRequestExists { .. }) => {
                tracing::warn!(
                    student_id = %student.user_id,
                    counselor_id = %counselor_id,
                    "submission refused: {e}"
                );
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!(student_id = %student.user_id, "submission failed: {e}");
                return Err(e.into());
            }
        };

        tracing::info!(
            request_id = %request.id,
            student_id = %student.user_id,
            counselor_id = %counselor_id,
            "connection request submitted"
        );
        self.log_activity(
            student.user_id,
            ActivityKind::ConnectionRequested,
            format!("Sent connection request to {}", counselor.display_name()),
        )
        .await;

        Ok(request)
    }

    /// Apply `event` to a request on behalf of `actor`
    ///
    /// The actor is re-read from the store and must hold the event's role;
    /// cancellation additionally requires the student to own the request.
    /// Repeating approve, reject or cancel is a no-op returning the current
    /// record. Reassignment returns the successor request.
    pub async fn apply_transition(
        &self,
        request_id: RequestId,
        event: Event,
        actor: &Actor,
    ) -> CoreResult<CounselorRequest> {
        let kind = event.kind();
        let actor = actor
            .authorize(&*self.store, kind.actor_role(), action_name(kind))
            .await?;

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.store.get_request(request_id).await?;

            if kind == EventKind::Cancel && current.student_id != actor.user_id {
                tracing::warn!(request_id = %request_id, user_id = %actor.user_id, "cancel by non-owner refused");
                return Err(CoreError::forbidden(
                    actor.user_id,
                    actor.role,
                    "cancel another student's request",
                ));
            }

            let target = match validate_transition(current.status, kind) {
                Ok(Step::Move(target)) => target,
                Ok(Step::Unchanged) => {
                    tracing::debug!(request_id = %request_id, event = %kind, "repeat event ignored");
                    return Ok(current);
                }
                Err(illegal) => {
                    tracing::warn!(request_id = %request_id, "{illegal}");
                    return Err(CoreError::IllegalTransition {
                        id: request_id,
                        from: illegal.from,
                        event: illegal.event,
                    });
                }
            };

            if let Event::Reassign { to } = &event {
                if *to == current.requested_counselor_id {
                    return Err(ValidationError::invalid(
                        "counselor",
                        "request is already addressed to this counselor",
                    )
                    .into());
                }
                self.check_reassign_target(*to).await?;
            }

            let patch = StatusPatch::new(target, actor.user_id, Utc::now()).with_notes(match &event {
                Event::Approve { notes } => notes.clone(),
                Event::Reject { reason } => Some(reason.clone()),
                Event::Reassign { .. } | Event::Cancel => None,
            });

            let written = match &event {
                Event::Reassign { to } => self
                    .store
                    .reassign_request(request_id, current.status, patch, *to)
                    .await
                    .map(|(closed, successor)| (closed, Some(successor))),
                _ => self
                    .store
                    .update_request_if_status(request_id, current.status, patch)
                    .await
                    .map(|updated| (updated, None)),
            };

            match written {
                Ok((updated, successor)) => {
                    tracing::info!(
                        request_id = %request_id,
                        student_id = %updated.student_id,
                        counselor_id = %updated.requested_counselor_id,
                        event = %kind,
                        from = %current.status,
                        to = %updated.status,
                        "request transitioned"
                    );
                    self.record_transition(&event, &updated, successor.as_ref())
                        .await;
                    return Ok(successor.unwrap_or(updated));
                }
                Err(StoreError::StaleStatus { actual, .. }) => {
                    tracing::debug!(
                        request_id = %request_id,
                        attempt,
                        actual = %actual,
                        "status moved underneath, revalidating"
                    );
                }
                Err(e) => {
                    tracing::error!(request_id = %request_id, event = %kind, "transition write failed: {e}");
                    return Err(e.into());
                }
            }
        }

        let current = self.store.get_request(request_id).await?;
        Err(CoreError::IllegalTransition {
            id: request_id,
            from: current.status,
            event: kind,
        })
    }

    /// Approve a pending request
    pub async fn approve(
        &self,
        request_id: RequestId,
        admin: &Actor,
        notes: Option<String>,
    ) -> CoreResult<CounselorRequest> {
        self.apply_transition(request_id, Event::Approve { notes }, admin)
            .await
    }

    /// Reject a pending request with a reason
    pub async fn reject(
        &self,
        request_id: RequestId,
        admin: &Actor,
        reason: impl Into<String>,
    ) -> CoreResult<CounselorRequest> {
        self.apply_transition(
            request_id,
            Event::Reject {
                reason: reason.into(),
            },
            admin,
        )
        .await
    }

    /// Redirect a pending request to another counselor; returns the successor
    pub async fn reassign(
        &self,
        request_id: RequestId,
        admin: &Actor,
        to: UserId,
    ) -> CoreResult<CounselorRequest> {
        self.apply_transition(request_id, Event::Reassign { to }, admin)
            .await
    }

    /// Withdraw the student's own request
    pub async fn cancel(&self, request_id: RequestId, student: &Actor) -> CoreResult<CounselorRequest> {
        self.apply_transition(request_id, Event::Cancel, student)
            .await
    }

    // ---- reads ----

    /// Request by id
    pub async fn request(&self, request_id: RequestId) -> CoreResult<CounselorRequest> {
        Ok(self.store.get_request(request_id).await?)
    }

    /// All requests, newest first
    pub async fn all_requests(&self) -> CoreResult<Vec<CounselorRequest>> {
        Ok(self.store.all_requests().await?)
    }

    /// Requests waiting for a decision, newest first
    pub async fn pending_requests(&self) -> CoreResult<Vec<CounselorRequest>> {
        self.requests_with_status(RequestStatus::Pending).await
    }

    /// Requests with `status`, newest first
    pub async fn requests_with_status(
        &self,
        status: RequestStatus,
    ) -> CoreResult<Vec<CounselorRequest>> {
        Ok(self.store.requests_by_status(status).await?)
    }

    /// A student's requests, newest first
    pub async fn student_requests(&self, student_id: UserId) -> CoreResult<Vec<CounselorRequest>> {
        Ok(self.store.requests_by_student(student_id).await?)
    }

    /// The student's pending or approved request, if any
    pub async fn active_request(&self, student_id: UserId) -> CoreResult<Option<CounselorRequest>> {
        Ok(self
            .store
            .requests_by_student(student_id)
            .await?
            .into_iter()
            .find(CounselorRequest::is_active))
    }

    /// Requests addressed to a counselor, newest first
    pub async fn counselor_requests(
        &self,
        counselor_id: UserId,
    ) -> CoreResult<Vec<CounselorRequest>> {
        Ok(self.store.requests_by_counselor(counselor_id).await?)
    }

    /// Students with an approved request for the counselor
    pub async fn approved_students_for_counselor(
        &self,
        counselor_id: UserId,
    ) -> CoreResult<Vec<RosterEntry>> {
        Ok(self.store.approved_students_for_counselor(counselor_id).await?)
    }

    /// Whether the pair has an approved connection
    pub async fn has_approved_connection(
        &self,
        student_id: UserId,
        counselor_id: UserId,
    ) -> CoreResult<bool> {
        Ok(self
            .store
            .requests_by_student(student_id)
            .await?
            .iter()
            .any(|r| r.status == RequestStatus::Approved && r.requested_counselor_id == counselor_id))
    }

    /// A user's activity feed, newest first
    pub async fn activity_feed(&self, user_id: UserId) -> CoreResult<Vec<Activity>> {
        Ok(self.store.activities_for_user(user_id).await?)
    }

    // ---- counters ----

    /// Counters for a student
    pub async fn student_stats(&self, student_id: UserId) -> CoreResult<StudentStats> {
        let requests = self.store.requests_by_student(student_id).await?;
        Ok(student_stats(&requests))
    }

    /// Counters for a counselor
    pub async fn counselor_stats(&self, counselor_id: UserId) -> CoreResult<CounselorStats> {
        let requests = self.store.requests_by_counselor(counselor_id).await?;
        let sessions = self.store.sessions_for_counselor(counselor_id).await?;
        Ok(counselor_stats(&requests, &sessions))
    }

    /// Request counts across the platform
    pub async fn summary(&self) -> CoreResult<RequestSummary> {
        let requests = self.store.all_requests().await?;
        Ok(summarize(&requests))
    }

    // ---- internals ----

    async fn check_reassign_target(&self, to: UserId) -> CoreResult<()> {
        match self.store.get_counselor(to).await {
            Ok(c) if c.is_available => Ok(()),
            Ok(c) => Err(ValidationError::invalid(
                "counselor",
                format!("{} is not accepting students", c.display_name()),
            )
            .into()),
            Err(StoreError::NotFound { .. }) => {
                Err(ValidationError::invalid("counselor", format!("{to} is not a counselor")).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn record_transition(
        &self,
        event: &Event,
        request: &CounselorRequest,
        successor: Option<&CounselorRequest>,
    ) {
        let counselor = self.name_of(request.requested_counselor_id).await;
        match event {
            Event::Approve { .. } => {
                let student = self.name_of(request.student_id).await;
                self.log_activity(
                    request.student_id,
                    ActivityKind::ConnectionApproved,
                    format!("Connection approved with {counselor}"),
                )
                .await;
                self.log_activity(
                    request.requested_counselor_id,
                    ActivityKind::StudentAssigned,
                    format!("New student assigned: {student}"),
                )
                .await;
            }
            Event::Reject { reason } => {
                let description = if reason.trim().is_empty() {
                    "Connection request rejected".to_string()
                } else {
                    format!("Connection request rejected: {reason}")
                };
                self.log_activity(request.student_id, ActivityKind::ConnectionRejected, description)
                    .await;
            }
            Event::Reassign { to } => {
                let new_counselor = self.name_of(*to).await;
                let successor = successor.map(|s| s.id.to_string()).unwrap_or_default();
                self.log_activity(
                    request.student_id,
                    ActivityKind::ConnectionReassigned,
                    format!("Request moved from {counselor} to {new_counselor} ({successor})"),
                )
                .await;
            }
            Event::Cancel => {
                self.log_activity(
                    request.student_id,
                    ActivityKind::ConnectionCancelled,
                    format!("Cancelled connection request with {counselor}"),
                )
                .await;
            }
        }
    }

    async fn name_of(&self, user_id: UserId) -> String {
        match self.store.get_user(user_id).await {
            Ok(user) => user.display_name(),
            Err(_) => user_id.to_string(),
        }
    }

    async fn log_activity(&self, user_id: UserId, kind: ActivityKind, description: String) {
        record_activity(&*self.store, user_id, kind, description).await;
    }
}

/// Append an activity entry, logging instead of failing
pub(crate) async fn record_activity<S>(
    store: &S,
    user_id: UserId,
    kind: ActivityKind,
    description: String,
) where
    S: RecordStore + ?Sized,
{
    let activity = Activity::new(user_id, kind, description);
    if let Err(e) = store.append_activity(activity).await {
        tracing::warn!(user_id = %user_id, kind = %kind, "activity not recorded: {e}");
    }
}

fn action_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Approve => "approve requests",
        EventKind::Reject => "reject requests",
        EventKind::Reassign => "reassign requests",
        EventKind::Cancel => "cancel requests",
    }
}

//! Store traits
//!
//! [`RecordStore`] is the typed CRUD surface the services are written
//! against. It shapes queries (filters, ordering) but carries no business
//! rules, with two deliberate exceptions that must be single conditional
//! writes on the backend:
//!
//! - [`RecordStore::create_request_if_no_active`] refuses to insert when the
//!   student already holds a pending or approved request
//! - [`RecordStore::update_request_if_status`] and
//!   [`RecordStore::reassign_request`] only write when the stored status still
//!   matches the status the caller decided on
//!
//! [`CatalogSource`] is the read-only view of the reference tables.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Activity, Counselor, CounselorRequest, Country, Course, NewCounselorRequest, NewSession,
    NewUser, Pathway, RequestId, RequestStatus, RosterEntry, Session, SessionId, SessionUpdate,
    StatusPatch, University, User, UserId,
};
use async_trait::async_trait;

/// Typed CRUD access to users, counselors, requests, sessions and activities
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ---- users ----

    /// Insert a user; fails with [`StoreError::Duplicate`] on a taken email
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// User by id
    async fn get_user(&self, id: UserId) -> StoreResult<User>;

    /// User by email (case-insensitive)
    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    /// All users, newest first
    async fn all_users(&self) -> StoreResult<Vec<User>>;

    // ---- counselors ----

    /// Insert or replace a counselor profile
    async fn upsert_counselor(&self, counselor: Counselor) -> StoreResult<Counselor>;

    /// Counselor profile by user id
    async fn get_counselor(&self, id: UserId) -> StoreResult<Counselor>;

    /// Counselor profile by email (case-insensitive)
    async fn get_counselor_by_email(&self, email: &str) -> StoreResult<Counselor>;

    /// All counselor profiles ordered by name
    async fn all_counselors(&self) -> StoreResult<Vec<Counselor>>;

    /// Toggle availability
    async fn set_counselor_availability(
        &self,
        id: UserId,
        is_available: bool,
    ) -> StoreResult<Counselor>;

    // ---- connection requests ----

    /// Insert a pending request unless the student already has an active one
    ///
    /// # Errors
    /// - `StoreError::ActiveRequestExists` when a pending or approved request
    ///   exists for the student
    async fn create_request_if_no_active(
        &self,
        request: NewCounselorRequest,
    ) -> StoreResult<CounselorRequest>;

    /// Request by id
    async fn get_request(&self, id: RequestId) -> StoreResult<CounselorRequest>;

    /// All requests, newest first
    async fn all_requests(&self) -> StoreResult<Vec<CounselorRequest>>;

    /// Requests with `status`, newest first
    async fn requests_by_status(&self, status: RequestStatus)
        -> StoreResult<Vec<CounselorRequest>>;

    /// Requests made by a student, newest first
    async fn requests_by_student(&self, student_id: UserId) -> StoreResult<Vec<CounselorRequest>>;

    /// Requests addressed to a counselor, newest first
    async fn requests_by_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<CounselorRequest>>;

    /// Apply `patch` only if the stored status equals `expected`
    ///
    /// # Errors
    /// - `StoreError::StaleStatus` when another writer moved the request first
    /// - `StoreError::NotFound` when the request does not exist
    async fn update_request_if_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
    ) -> StoreResult<CounselorRequest>;

    /// Close a request as reassigned and open its successor atomically
    ///
    /// Returns `(closed, successor)`. The successor is pending, addressed to
    /// `new_counselor`, and links back through `reassigned_from`.
    async fn reassign_request(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
        new_counselor: UserId,
    ) -> StoreResult<(CounselorRequest, CounselorRequest)>;

    /// Delete every request of a student; returns the number removed
    async fn delete_requests_for_student(&self, student_id: UserId) -> StoreResult<u64>;

    /// Approved requests for a counselor joined with the student records,
    /// most recently approved first
    async fn approved_students_for_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<RosterEntry>> {
        let mut approved: Vec<_> = self
            .requests_by_counselor(counselor_id)
            .await?
            .into_iter()
            .filter(|r| r.status == RequestStatus::Approved)
            .collect();
        approved.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));

        let mut roster = Vec::with_capacity(approved.len());
        for request in approved {
            match self.get_user(request.student_id).await {
                Ok(student) => roster.push(RosterEntry { request, student }),
                Err(StoreError::NotFound { .. }) => {
                    tracing::warn!(
                        request_id = %request.id,
                        student_id = %request.student_id,
                        "approved request references a missing student"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(roster)
    }

    // ---- sessions ----

    /// Insert a scheduled session
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session>;

    /// Session by id
    async fn get_session(&self, id: SessionId) -> StoreResult<Session>;

    /// Apply an update to a session
    async fn update_session(&self, id: SessionId, update: SessionUpdate) -> StoreResult<Session>;

    /// Sessions of a counselor ordered by date and time
    async fn sessions_for_counselor(&self, counselor_id: UserId) -> StoreResult<Vec<Session>>;

    /// Sessions of a student ordered by date and time
    async fn sessions_for_student(&self, student_id: UserId) -> StoreResult<Vec<Session>>;

    // ---- activity feed ----

    /// Append an activity entry
    async fn append_activity(&self, activity: Activity) -> StoreResult<()>;

    /// A user's activity feed, newest first
    async fn activities_for_user(&self, user_id: UserId) -> StoreResult<Vec<Activity>>;
}

/// Read-only access to the reference catalog tables
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All countries ordered by name
    async fn countries(&self) -> StoreResult<Vec<Country>>;

    /// All universities ordered by name
    async fn universities(&self) -> StoreResult<Vec<University>>;

    /// All courses ordered by program name
    async fn courses(&self) -> StoreResult<Vec<Course>>;

    /// All pathways ordered by name
    async fn pathways(&self) -> StoreResult<Vec<Pathway>>;
}

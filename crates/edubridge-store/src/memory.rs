//! In-process record store

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Activity, Counselor, CounselorRequest, Country, Course, NewCounselorRequest, NewSession,
    NewUser, Pathway, RequestId, RequestStatus, Session, SessionId, SessionUpdate, StatusPatch,
    University, User, UserId,
};
use crate::store::{CatalogSource, RecordStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    counselors: HashMap<UserId, Counselor>,
    requests: HashMap<RequestId, CounselorRequest>,
    sessions: HashMap<SessionId, Session>,
    activities: Vec<Activity>,
    countries: Vec<Country>,
    universities: Vec<University>,
    courses: Vec<Course>,
    pathways: Vec<Pathway>,
}

impl Tables {
    fn active_request_of(&self, student_id: UserId) -> Option<&CounselorRequest> {
        self.requests
            .values()
            .find(|r| r.student_id == student_id && r.is_active())
    }

    fn requests_where(&self, pred: impl Fn(&CounselorRequest) -> bool) -> Vec<CounselorRequest> {
        let mut out: Vec<_> = self.requests.values().filter(|r| pred(r)).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    fn sessions_where(&self, pred: impl Fn(&Session) -> bool) -> Vec<Session> {
        let mut out: Vec<_> = self.sessions.values().filter(|s| pred(s)).cloned().collect();
        out.sort_by(|a, b| {
            (a.scheduled_date, a.scheduled_time).cmp(&(b.scheduled_date, b.scheduled_time))
        });
        out
    }

    /// Conditional status write shared by update and reassign
    fn swap_status(
        &mut self,
        id: RequestId,
        expected: RequestStatus,
        patch: &StatusPatch,
    ) -> StoreResult<CounselorRequest> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("counselor request", id))?;
        if request.status != expected {
            return Err(StoreError::StaleStatus {
                id,
                expected,
                actual: request.status,
            });
        }
        patch.apply(request);
        Ok(request.clone())
    }
}

/// In-memory record store for tests, demos and the CLI fallback
///
/// All tables sit behind one lock, so every conditional write is atomic with
/// respect to concurrent callers.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog tables
    pub fn load_catalog(
        &self,
        countries: Vec<Country>,
        universities: Vec<University>,
        courses: Vec<Course>,
        pathways: Vec<Pathway>,
    ) {
        let mut tables = self.tables.write();
        tables.countries = countries;
        tables.universities = universities;
        tables.courses = courses;
        tables.pathways = pathways;
    }

    /// Number of stored requests
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.tables.read().requests.len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user(UserId::new(), Utc::now());
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let email = email.trim().to_lowercase();
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<_> = self.tables.read().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn upsert_counselor(&self, counselor: Counselor) -> StoreResult<Counselor> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&counselor.user_id) {
            return Err(StoreError::not_found("user", counselor.user_id));
        }
        tables.counselors.insert(counselor.user_id, counselor.clone());
        Ok(counselor)
    }

    async fn get_counselor(&self, id: UserId) -> StoreResult<Counselor> {
        self.tables
            .read()
            .counselors
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("counselor", id))
    }

    async fn get_counselor_by_email(&self, email: &str) -> StoreResult<Counselor> {
        let email = email.trim().to_lowercase();
        self.tables
            .read()
            .counselors
            .values()
            .find(|c| c.email.to_lowercase() == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("counselor", email))
    }

    async fn all_counselors(&self) -> StoreResult<Vec<Counselor>> {
        let mut counselors: Vec<_> = self.tables.read().counselors.values().cloned().collect();
        counselors.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.user_id).cmp(&(&b.last_name, &b.first_name, b.user_id))
        });
        Ok(counselors)
    }

    async fn set_counselor_availability(
        &self,
        id: UserId,
        is_available: bool,
    ) -> StoreResult<Counselor> {
        let mut tables = self.tables.write();
        let counselor = tables
            .counselors
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("counselor", id))?;
        counselor.is_available = is_available;
        Ok(counselor.clone())
    }

    async fn create_request_if_no_active(
        &self,
        request: NewCounselorRequest,
    ) -> StoreResult<CounselorRequest> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.active_request_of(request.student_id) {
            return Err(StoreError::ActiveRequestExists {
                student_id: request.student_id,
                existing: existing.id,
            });
        }
        let record = request.into_request(RequestId::new(), Utc::now());
        tables.requests.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<CounselorRequest> {
        self.tables
            .read()
            .requests
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("counselor request", id))
    }

    async fn all_requests(&self) -> StoreResult<Vec<CounselorRequest>> {
        Ok(self.tables.read().requests_where(|_| true))
    }

    async fn requests_by_status(
        &self,
        status: RequestStatus,
    ) -> StoreResult<Vec<CounselorRequest>> {
        Ok(self.tables.read().requests_where(|r| r.status == status))
    }

    async fn requests_by_student(&self, student_id: UserId) -> StoreResult<Vec<CounselorRequest>> {
        Ok(self
            .tables
            .read()
            .requests_where(|r| r.student_id == student_id))
    }

    async fn requests_by_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<CounselorRequest>> {
        Ok(self
            .tables
            .read()
            .requests_where(|r| r.requested_counselor_id == counselor_id))
    }

    async fn update_request_if_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
    ) -> StoreResult<CounselorRequest> {
        self.tables.write().swap_status(id, expected, &patch)
    }

    async fn reassign_request(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
        new_counselor: UserId,
    ) -> StoreResult<(CounselorRequest, CounselorRequest)> {
        let mut tables = self.tables.write();
        let closed = tables.swap_status(id, expected, &patch)?;

        let successor = NewCounselorRequest {
            student_id: closed.student_id,
            requested_counselor_id: new_counselor,
            request_reason: closed.request_reason.clone(),
            reassigned_from: Some(closed.id),
        }
        .into_request(RequestId::new(), patch.at);
        tables.requests.insert(successor.id, successor.clone());

        Ok((closed, successor))
    }

    async fn delete_requests_for_student(&self, student_id: UserId) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let before = tables.requests.len();
        tables.requests.retain(|_, r| r.student_id != student_id);
        Ok((before - tables.requests.len()) as u64)
    }

    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let session = session.into_session(SessionId::new(), Utc::now());
        self.tables
            .write()
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.tables
            .read()
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("session", id))
    }

    async fn update_session(&self, id: SessionId, update: SessionUpdate) -> StoreResult<Session> {
        let mut tables = self.tables.write();
        let session = tables
            .sessions
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("session", id))?;
        update.apply(session);
        Ok(session.clone())
    }

    async fn sessions_for_counselor(&self, counselor_id: UserId) -> StoreResult<Vec<Session>> {
        Ok(self
            .tables
            .read()
            .sessions_where(|s| s.counselor_id == counselor_id))
    }

    async fn sessions_for_student(&self, student_id: UserId) -> StoreResult<Vec<Session>> {
        Ok(self
            .tables
            .read()
            .sessions_where(|s| s.student_id == student_id))
    }

    async fn append_activity(&self, activity: Activity) -> StoreResult<()> {
        self.tables.write().activities.push(activity);
        Ok(())
    }

    async fn activities_for_user(&self, user_id: UserId) -> StoreResult<Vec<Activity>> {
        // Appends are chronological, so reversing yields newest first.
        Ok(self
            .tables
            .read()
            .activities
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogSource for MemoryStore {
    async fn countries(&self) -> StoreResult<Vec<Country>> {
        let mut out = self.tables.read().countries.clone();
        out.sort_by(|a, b| a.country_name.cmp(&b.country_name));
        Ok(out)
    }

    async fn universities(&self) -> StoreResult<Vec<University>> {
        let mut out = self.tables.read().universities.clone();
        out.sort_by(|a, b| a.university_name.cmp(&b.university_name));
        Ok(out)
    }

    async fn courses(&self) -> StoreResult<Vec<Course>> {
        let mut out = self.tables.read().courses.clone();
        out.sort_by(|a, b| a.program_name.cmp(&b.program_name));
        Ok(out)
    }

    async fn pathways(&self) -> StoreResult<Vec<Pathway>> {
        let mut out = self.tables.read().pathways.clone();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

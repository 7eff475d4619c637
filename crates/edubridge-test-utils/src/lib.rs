//! Testing utilities for the EduBridge workspace
//!
//! Seeded in-memory stores, record builders and a store whose activity
//! log always fails.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use edubridge_store::{
    Activity, Counselor, CounselorRequest, Country, Course, MemoryStore, NewCounselorRequest,
    NewSession, NewUser, Pathway, RecordStore, RequestId, RequestStatus, Role, Session, SessionId,
    SessionType, SessionUpdate, StatusPatch, StoreError, StoreResult, University, User, UserId,
};
use std::sync::Arc;

/// A store with one admin, some students and some available counselors
#[derive(Debug, Clone)]
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub admin: User,
    pub students: Vec<User>,
    pub counselors: Vec<Counselor>,
}

impl Fixture {
    pub async fn seeded(students: usize, counselors: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(new_user("admin@test.local", Role::Admin))
            .await
            .unwrap();

        let mut student_users = Vec::with_capacity(students);
        for i in 0..students {
            let user = store
                .insert_user(new_user(&format!("student{i}@test.local"), Role::Student))
                .await
                .unwrap();
            student_users.push(user);
        }

        let mut counselor_rows = Vec::with_capacity(counselors);
        for i in 0..counselors {
            let user = store
                .insert_user(new_user(&format!("counselor{i}@test.local"), Role::Counselor))
                .await
                .unwrap();
            let counselor = store
                .upsert_counselor(Counselor::for_user(&user).with_specializations(["General"]))
                .await
                .unwrap();
            counselor_rows.push(counselor);
        }

        Self {
            store,
            admin,
            students: student_users,
            counselors: counselor_rows,
        }
    }

    pub fn student(&self, i: usize) -> &User {
        &self.students[i]
    }

    pub fn counselor_id(&self, i: usize) -> UserId {
        self.counselors[i].user_id
    }

    /// User record behind counselor `i`
    pub async fn counselor_user(&self, i: usize) -> User {
        self.store.get_user(self.counselor_id(i)).await.unwrap()
    }

    pub fn with_catalog(self) -> Self {
        self.store
            .load_catalog(sample_countries(), sample_universities(), sample_courses(), sample_pathways());
        self
    }
}

pub fn new_user(email: &str, role: Role) -> NewUser {
    let local = email.split('@').next().unwrap_or(email);
    NewUser::new(email, local, "Tester", role)
}

pub fn session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 14).unwrap()
}

pub fn session_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap()
}

pub fn new_session(student_id: UserId, counselor_id: UserId) -> NewSession {
    NewSession {
        student_id,
        counselor_id,
        session_type: SessionType::Consultation,
        session_title: "Intro call".into(),
        session_description: None,
        scheduled_date: session_date(),
        scheduled_time: session_time(),
        duration_minutes: 60,
        meeting_link: None,
        notes: None,
    }
}

pub fn sample_countries() -> Vec<Country> {
    vec![
        Country {
            country_id: 1,
            country_name: "Canada".into(),
            country_code: Some("CA".into()),
        },
        Country {
            country_id: 2,
            country_name: "Australia".into(),
            country_code: Some("AU".into()),
        },
    ]
}

pub fn sample_universities() -> Vec<University> {
    vec![
        University {
            id: 10,
            university_name: "University of Toronto".into(),
            city: Some("Toronto".into()),
            state_province: Some("Ontario".into()),
            country_id: 1,
            university_type: Some("public".into()),
        },
        University {
            id: 11,
            university_name: "Bond University".into(),
            city: Some("Gold Coast".into()),
            state_province: Some("Queensland".into()),
            country_id: 2,
            university_type: Some("private".into()),
        },
    ]
}

pub fn sample_courses() -> Vec<Course> {
    vec![
        Course {
            id: 100,
            program_name: "Computer Science".into(),
            university_id: 10,
            degree_level: Some("Bachelor".into()),
        },
        Course {
            id: 101,
            program_name: "Law".into(),
            university_id: 11,
            degree_level: Some("Master".into()),
        },
    ]
}

pub fn sample_pathways() -> Vec<Pathway> {
    vec![Pathway {
        id: 1,
        name: "Diploma to Degree".into(),
        description: None,
    }]
}

/// Delegates to a [`MemoryStore`] but refuses every activity append
#[derive(Debug, Clone)]
pub struct FailingActivityLog {
    pub inner: Arc<MemoryStore>,
}

impl FailingActivityLog {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RecordStore for FailingActivityLog {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.inner.get_user_by_email(email).await
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        self.inner.all_users().await
    }

    async fn upsert_counselor(&self, counselor: Counselor) -> StoreResult<Counselor> {
        self.inner.upsert_counselor(counselor).await
    }

    async fn get_counselor(&self, id: UserId) -> StoreResult<Counselor> {
        self.inner.get_counselor(id).await
    }

    async fn get_counselor_by_email(&self, email: &str) -> StoreResult<Counselor> {
        self.inner.get_counselor_by_email(email).await
    }

    async fn all_counselors(&self) -> StoreResult<Vec<Counselor>> {
        self.inner.all_counselors().await
    }

    async fn set_counselor_availability(
        &self,
        id: UserId,
        is_available: bool,
    ) -> StoreResult<Counselor> {
        self.inner.set_counselor_availability(id, is_available).await
    }

    async fn create_request_if_no_active(
        &self,
        request: NewCounselorRequest,
    ) -> StoreResult<CounselorRequest> {
        self.inner.create_request_if_no_active(request).await
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<CounselorRequest> {
        self.inner.get_request(id).await
    }

    async fn all_requests(&self) -> StoreResult<Vec<CounselorRequest>> {
        self.inner.all_requests().await
    }

    async fn requests_by_status(
        &self,
        status: RequestStatus,
    ) -> StoreResult<Vec<CounselorRequest>> {
        self.inner.requests_by_status(status).await
    }

    async fn requests_by_student(&self, student_id: UserId) -> StoreResult<Vec<CounselorRequest>> {
        self.inner.requests_by_student(student_id).await
    }

    async fn requests_by_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<CounselorRequest>> {
        self.inner.requests_by_counselor(counselor_id).await
    }

    async fn update_request_if_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
    ) -> StoreResult<CounselorRequest> {
        self.inner.update_request_if_status(id, expected, patch).await
    }

    async fn reassign_request(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
        new_counselor: UserId,
    ) -> StoreResult<(CounselorRequest, CounselorRequest)> {
        self.inner
            .reassign_request(id, expected, patch, new_counselor)
            .await
    }

    async fn delete_requests_for_student(&self, student_id: UserId) -> StoreResult<u64> {
        self.inner.delete_requests_for_student(student_id).await
    }

    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        self.inner.insert_session(session).await
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        self.inner.get_session(id).await
    }

    async fn update_session(&self, id: SessionId, update: SessionUpdate) -> StoreResult<Session> {
        self.inner.update_session(id, update).await
    }

    async fn sessions_for_counselor(&self, counselor_id: UserId) -> StoreResult<Vec<Session>> {
        self.inner.sessions_for_counselor(counselor_id).await
    }

    async fn sessions_for_student(&self, student_id: UserId) -> StoreResult<Vec<Session>> {
        self.inner.sessions_for_student(student_id).await
    }

    async fn append_activity(&self, _activity: Activity) -> StoreResult<()> {
        Err(StoreError::Backend("activity log unavailable".into()))
    }

    async fn activities_for_user(&self, user_id: UserId) -> StoreResult<Vec<Activity>> {
        self.inner.activities_for_user(user_id).await
    }
}

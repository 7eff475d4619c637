//! PgStore against a live database
//!
//! Runs only when `DATABASE_URL` points at a Postgres instance; every test
//! uses fresh emails so runs can share one database.

#![cfg(feature = "postgres")]

use chrono::{NaiveDate, NaiveTime, Utc};
use edubridge_store::{
    Activity, ActivityKind, Counselor, NewCounselorRequest, NewSession, NewUser, PgStore,
    RecordStore, RequestStatus, Role, SessionStatus, SessionType, SessionUpdate, StatusPatch,
    StoreError, User,
};
use uuid::Uuid;

async fn store() -> Option<PgStore> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping postgres test");
        return None;
    };
    let store = PgStore::connect(&url, 4).await.unwrap();
    store.migrate().await.unwrap();
    Some(store)
}

async fn user(store: &PgStore, role: Role) -> User {
    let email = format!("{}-{}@pg.test", role.as_str(), Uuid::new_v4().simple());
    store
        .insert_user(NewUser::new(&email, "Pg", "Tester", role))
        .await
        .unwrap()
}

async fn counselor(store: &PgStore, specializations: &[&str]) -> User {
    let user = user(store, Role::Counselor).await;
    store
        .upsert_counselor(Counselor::for_user(&user).with_specializations(specializations.iter().copied()))
        .await
        .unwrap();
    user
}

#[tokio::test]
async fn test_second_active_request_is_refused() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;
    let (a, b) = (counselor(&store, &[]).await, counselor(&store, &[]).await);

    let first = store
        .create_request_if_no_active(NewCounselorRequest::new(student.id, a.id))
        .await
        .unwrap();
    let err = store
        .create_request_if_no_active(NewCounselorRequest::new(student.id, b.id))
        .await
        .unwrap_err();

    match err {
        StoreError::ActiveRequestExists { existing, .. } => assert_eq!(existing, first.id),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.requests_by_student(student.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_status_write_is_refused() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;
    let admin = user(&store, Role::Admin).await;
    let c = counselor(&store, &[]).await;
    let request = store
        .create_request_if_no_active(NewCounselorRequest::new(student.id, c.id))
        .await
        .unwrap();

    let approve = StatusPatch::new(RequestStatus::Approved, admin.id, Utc::now())
        .with_notes(Some("welcome".into()));
    let approved = store
        .update_request_if_status(request.id, RequestStatus::Pending, approve.clone())
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by, Some(admin.id));
    assert!(approved.approved_at.is_some());
    assert_eq!(approved.admin_notes.as_deref(), Some("welcome"));

    let err = store
        .update_request_if_status(request.id, RequestStatus::Pending, approve)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::StaleStatus {
            expected: RequestStatus::Pending,
            actual: RequestStatus::Approved,
            ..
        }
    ));

    // Cancelling without notes keeps the approval remark
    let cancel = StatusPatch::new(RequestStatus::Cancelled, student.id, Utc::now());
    let cancelled = store
        .update_request_if_status(request.id, RequestStatus::Approved, cancel)
        .await
        .unwrap();
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(cancelled.admin_notes.as_deref(), Some("welcome"));
}

#[tokio::test]
async fn test_reassign_closes_original_and_opens_successor() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;
    let admin = user(&store, Role::Admin).await;
    let (a, b) = (counselor(&store, &[]).await, counselor(&store, &[]).await);
    let original = store
        .create_request_if_no_active(
            NewCounselorRequest::new(student.id, a.id).with_reason("MBA"),
        )
        .await
        .unwrap();

    let patch = StatusPatch::new(RequestStatus::Reassigned, admin.id, Utc::now());
    let (closed, successor) = store
        .reassign_request(original.id, RequestStatus::Pending, patch.clone(), b.id)
        .await
        .unwrap();

    assert_eq!(closed.status, RequestStatus::Reassigned);
    assert_eq!(successor.status, RequestStatus::Pending);
    assert_eq!(successor.requested_counselor_id, b.id);
    assert_eq!(successor.reassigned_from, Some(original.id));
    assert_eq!(successor.request_reason.as_deref(), Some("MBA"));

    // A second reassign of the closed original changes nothing
    let err = store
        .reassign_request(original.id, RequestStatus::Pending, patch, a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::StaleStatus { .. }));
    assert_eq!(store.requests_by_student(student.id).await.unwrap().len(), 2);

    assert_eq!(store.delete_requests_for_student(student.id).await.unwrap(), 2);
    assert!(store.requests_by_student(student.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_roster_joins_approved_students() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;
    let pending = user(&store, Role::Student).await;
    let admin = user(&store, Role::Admin).await;
    let c = counselor(&store, &[]).await;

    let request = store
        .create_request_if_no_active(NewCounselorRequest::new(student.id, c.id))
        .await
        .unwrap();
    store
        .create_request_if_no_active(NewCounselorRequest::new(pending.id, c.id))
        .await
        .unwrap();
    store
        .update_request_if_status(
            request.id,
            RequestStatus::Pending,
            StatusPatch::new(RequestStatus::Approved, admin.id, Utc::now()),
        )
        .await
        .unwrap();

    let roster = store.approved_students_for_counselor(c.id).await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].request.id, request.id);
    assert_eq!(roster[0].student.email, student.email);
    assert_eq!(
        store
            .requests_by_status(RequestStatus::Pending)
            .await
            .unwrap()
            .iter()
            .filter(|r| r.requested_counselor_id == c.id)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_records_decode_back() {
    let Some(store) = store().await else { return };
    let student = user(&store, Role::Student).await;
    let c = counselor(&store, &["Canada", "MBA"]).await;

    let loaded = store.get_user_by_email(&student.email.to_uppercase()).await.unwrap();
    assert_eq!(loaded.id, student.id);
    assert_eq!(loaded.role, Role::Student);

    let profile = store.get_counselor(c.id).await.unwrap();
    assert_eq!(profile.specializations, vec!["Canada".to_string(), "MBA".to_string()]);
    assert!(profile.is_available);
    let hidden = store.set_counselor_availability(c.id, false).await.unwrap();
    assert!(!hidden.is_available);

    let session = store
        .insert_session(NewSession {
            student_id: student.id,
            counselor_id: c.id,
            session_type: SessionType::InterviewPrep,
            session_title: "Visa interview".into(),
            session_description: Some("mock questions".into()),
            scheduled_date: NaiveDate::from_ymd_opt(2030, 3, 14).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            duration_minutes: 45,
            meeting_link: None,
            notes: None,
        })
        .await
        .unwrap();
    let fetched = store.get_session(session.id).await.unwrap();
    assert_eq!(fetched.session_type, SessionType::InterviewPrep);
    assert_eq!(fetched.status, SessionStatus::Scheduled);
    assert_eq!(fetched.duration_minutes, 45);
    assert_eq!(fetched.scheduled_time, session.scheduled_time);

    let done = store
        .update_session(
            session.id,
            SessionUpdate {
                completion_notes: Some("went well".into()),
                rating: Some(5),
                ..SessionUpdate::new(SessionStatus::Completed, Utc::now())
            },
        )
        .await
        .unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.rating, Some(5));
    assert_eq!(store.sessions_for_student(student.id).await.unwrap().len(), 1);

    store
        .append_activity(Activity::new(
            student.id,
            ActivityKind::SessionCompleted,
            "Visa interview completed",
        ))
        .await
        .unwrap();
    let feed = store.activities_for_user(student.id).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, ActivityKind::SessionCompleted);
}

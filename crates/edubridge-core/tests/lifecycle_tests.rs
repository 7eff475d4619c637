use edubridge_core::{Actor, ConnectionService, CoreError, EventKind};
use edubridge_store::{ActivityKind, RecordStore, RequestStatus, Role, StoreError, UserId};
use edubridge_test_utils::{FailingActivityLog, Fixture};
use std::sync::Arc;
use pretty_assertions::assert_eq;

async fn setup() -> (Fixture, ConnectionService<edubridge_store::MemoryStore>) {
    let fx = Fixture::seeded(2, 2).await;
    let service = ConnectionService::new(fx.store.clone());
    (fx, service)
}

#[tokio::test]
async fn test_submit_then_approve_lists_student_on_roster() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), Some("MBA in Canada".into()))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.request_reason.as_deref(), Some("MBA in Canada"));

    let approved = service
        .approve(request.id, &admin, Some("welcome".into()))
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approved_by, Some(admin.user_id));
    assert!(approved.approved_at.is_some());
    assert_eq!(approved.admin_notes.as_deref(), Some("welcome"));

    let roster = service
        .approved_students_for_counselor(fx.counselor_id(0))
        .await
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].student.id, student.user_id);
    assert!(service
        .has_approved_connection(student.user_id, fx.counselor_id(0))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_reject_keeps_reason_verbatim() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    let rejected = service.reject(request.id, &admin, "duplicate").await.unwrap();

    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.admin_notes.as_deref(), Some("duplicate"));
    assert_eq!(rejected.rejected_by, Some(admin.user_id));
    assert!(rejected.rejected_at.is_some());

    // A closed request frees the student to ask again
    let again = service
        .submit_request(&student, fx.counselor_id(1), None)
        .await
        .unwrap();
    assert_eq!(again.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_second_active_request_is_refused() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));

    let first = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    let err = service
        .submit_request(&student, fx.counselor_id(1), None)
        .await
        .unwrap_err();

    match err {
        CoreError::Store(StoreError::ActiveRequestExists { existing, .. }) => {
            assert_eq!(existing, first.id)
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fx.store.request_count(), 1);
}

#[tokio::test]
async fn test_reassign_moves_student_to_new_counselor() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);
    let (a, b) = (fx.counselor_id(0), fx.counselor_id(1));

    let original = service.submit_request(&student, a, None).await.unwrap();
    let successor = service.reassign(original.id, &admin, b).await.unwrap();

    assert_ne!(successor.id, original.id);
    assert_eq!(successor.status, RequestStatus::Pending);
    assert_eq!(successor.requested_counselor_id, b);
    assert_eq!(successor.reassigned_from, Some(original.id));

    let closed = service.request(original.id).await.unwrap();
    assert_eq!(closed.status, RequestStatus::Reassigned);

    service.approve(successor.id, &admin, None).await.unwrap();
    assert!(service
        .approved_students_for_counselor(a)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        service.approved_students_for_counselor(b).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_reassign_to_same_or_unknown_counselor_fails() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();

    let same = service
        .reassign(request.id, &admin, fx.counselor_id(0))
        .await
        .unwrap_err();
    assert!(matches!(same, CoreError::Validation(_)));

    let unknown = service
        .reassign(request.id, &admin, UserId::new())
        .await
        .unwrap_err();
    assert!(matches!(unknown, CoreError::Validation(_)));

    assert_eq!(
        service.request(request.id).await.unwrap().status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn test_reassign_of_closed_request_is_illegal_even_to_same_counselor() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.reject(request.id, &admin, "no fit").await.unwrap();

    let err = service
        .reassign(request.id, &admin, fx.counselor_id(0))
        .await
        .unwrap_err();
    match err {
        CoreError::IllegalTransition { from, event, .. } => {
            assert_eq!(from, RequestStatus::Rejected);
            assert_eq!(event, EventKind::Reassign);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_repeat_approve_is_a_no_op() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    let first = service.approve(request.id, &admin, None).await.unwrap();
    let second = service
        .approve(request.id, &admin, Some("again".into()))
        .await
        .unwrap();

    assert_eq!(first, second);
    let approvals = service
        .activity_feed(student.user_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.kind == ActivityKind::ConnectionApproved)
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn test_illegal_transitions_leave_request_untouched() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.reject(request.id, &admin, "no fit").await.unwrap();

    let err = service.approve(request.id, &admin, None).await.unwrap_err();
    match err {
        CoreError::IllegalTransition { id, from, event } => {
            assert_eq!(id, request.id);
            assert_eq!(from, RequestStatus::Rejected);
            assert_eq!(event, EventKind::Approve);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        service.cancel(request.id, &student).await,
        Err(CoreError::IllegalTransition { .. })
    ));
    assert_eq!(
        service.request(request.id).await.unwrap().status,
        RequestStatus::Rejected
    );
}

#[tokio::test]
async fn test_approved_request_can_be_cancelled_by_owner() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.approve(request.id, &admin, None).await.unwrap();
    let cancelled = service.cancel(request.id, &student).await.unwrap();

    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert!(service.active_request(student.user_id).await.unwrap().is_none());
    assert!(service
        .approved_students_for_counselor(fx.counselor_id(0))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_actors_outside_their_role_are_forbidden() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let other = Actor::from_user(fx.student(1));
    let counselor = Actor::from_user(&fx.counselor_user(0).await);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();

    assert!(matches!(
        service.approve(request.id, &student, None).await,
        Err(CoreError::Forbidden { .. })
    ));
    assert!(matches!(
        service.approve(request.id, &counselor, None).await,
        Err(CoreError::Forbidden { .. })
    ));
    assert!(matches!(
        service.cancel(request.id, &other).await,
        Err(CoreError::Forbidden { .. })
    ));
    assert!(matches!(
        service.submit_request(&counselor, fx.counselor_id(1), None).await,
        Err(CoreError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_stale_actor_snapshot_is_refreshed() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));

    // Claims admin, but the store says student
    let mut forged = Actor::from_user(fx.student(1));
    forged.role = Role::Admin;

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    assert!(matches!(
        service.approve(request.id, &forged, None).await,
        Err(CoreError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_unavailable_counselor_cannot_be_requested() {
    let (fx, service) = setup().await;
    fx.store
        .set_counselor_availability(fx.counselor_id(0), false)
        .await
        .unwrap();
    let student = Actor::from_user(fx.student(0));

    let err = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_activity_log_follows_lifecycle() {
    let (fx, service) = setup().await;
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.approve(request.id, &admin, None).await.unwrap();

    let kinds: Vec<_> = service
        .activity_feed(student.user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![ActivityKind::ConnectionApproved, ActivityKind::ConnectionRequested]
    );

    let counselor_feed = service.activity_feed(fx.counselor_id(0)).await.unwrap();
    assert_eq!(counselor_feed.len(), 1);
    assert_eq!(counselor_feed[0].kind, ActivityKind::StudentAssigned);
}

#[tokio::test]
async fn test_summary_and_stats() {
    let (fx, service) = setup().await;
    let admin = Actor::from_user(&fx.admin);
    let first = Actor::from_user(fx.student(0));
    let second = Actor::from_user(fx.student(1));

    let a = service
        .submit_request(&first, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.approve(a.id, &admin, None).await.unwrap();
    let b = service
        .submit_request(&second, fx.counselor_id(0), None)
        .await
        .unwrap();
    service.reject(b.id, &admin, "full").await.unwrap();
    service
        .submit_request(&second, fx.counselor_id(1), None)
        .await
        .unwrap();

    let summary = service.summary().await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.approved, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.pending, 1);

    let stats = service.student_stats(second.user_id).await.unwrap();
    assert_eq!(stats.pending_connections, 1);
    assert_eq!(stats.active_connections, 0);

    let counselor = service.counselor_stats(fx.counselor_id(0)).await.unwrap();
    assert_eq!(counselor.active_students, 1);
    assert_eq!(counselor.total_requests, 2);
    assert_eq!(service.pending_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_activity_log_failure_does_not_fail_transitions() {
    let fx = Fixture::seeded(1, 2).await;
    let service = ConnectionService::new(Arc::new(FailingActivityLog::new(fx.store.clone())));
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);

    let request = service
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let successor = service
        .reassign(request.id, &admin, fx.counselor_id(1))
        .await
        .unwrap();
    let approved = service.approve(successor.id, &admin, None).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    assert_eq!(
        fx.store.get_request(request.id).await.unwrap().status,
        RequestStatus::Reassigned
    );
    assert_eq!(
        fx.store.get_request(successor.id).await.unwrap().status,
        RequestStatus::Approved
    );
    assert!(fx
        .store
        .activities_for_user(student.user_id)
        .await
        .unwrap()
        .is_empty());
}

use edubridge_core::{Actor, BookingConfig, BookingService, ConnectionService, CoreError, SessionForm};
use edubridge_store::{ActivityKind, MemoryStore, RecordStore, SessionStatus, SessionType};
use edubridge_test_utils::{session_date, session_time, Fixture};
use pretty_assertions::assert_eq;

struct Booked {
    fx: Fixture,
    bookings: BookingService<MemoryStore>,
    student: Actor,
    counselor: Actor,
}

/// Fixture where student 0 has an approved connection with counselor 0
async fn connected() -> Booked {
    let fx = Fixture::seeded(2, 2).await;
    let connections = ConnectionService::new(fx.store.clone());
    let student = Actor::from_user(fx.student(0));
    let admin = Actor::from_user(&fx.admin);
    let request = connections
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    connections.approve(request.id, &admin, None).await.unwrap();

    let counselor = Actor::from_user(&fx.counselor_user(0).await);
    let bookings = BookingService::new(fx.store.clone(), BookingConfig::default());
    Booked {
        fx,
        bookings,
        student,
        counselor,
    }
}

fn form() -> SessionForm {
    SessionForm::new("Application strategy", session_date(), session_time())
        .with_type(SessionType::ApplicationHelp)
        .with_duration(90)
}

#[tokio::test]
async fn test_counselor_books_approved_student() {
    let b = connected().await;

    let session = b
        .bookings
        .create_session(&b.counselor, b.student.user_id, b.counselor.user_id, form())
        .await
        .unwrap();

    assert_eq!(session.status, SessionStatus::Scheduled);
    assert_eq!(session.duration_minutes, 90);
    assert_eq!(session.session_type, SessionType::ApplicationHelp);
    assert_eq!(
        b.bookings
            .sessions_for_student(b.student.user_id)
            .await
            .unwrap(),
        vec![session.clone()]
    );

    let feed = b.fx.store.activities_for_user(b.counselor.user_id).await.unwrap();
    assert_eq!(feed[0].kind, ActivityKind::SessionScheduled);
}

#[tokio::test]
async fn test_booking_without_approved_connection_is_refused() {
    let b = connected().await;
    let other_counselor = b.fx.counselor_id(1);

    let err = b
        .bookings
        .create_session(&b.student, b.student.user_id, other_counselor, form())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoApprovedConnection { .. }));

    let stranger = Actor::from_user(b.fx.student(1));
    let err = b
        .bookings
        .create_session(&stranger, stranger.user_id, b.counselor.user_id, form())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoApprovedConnection { .. }));
}

#[tokio::test]
async fn test_third_party_cannot_book_for_others() {
    let b = connected().await;
    let stranger = Actor::from_user(b.fx.student(1));

    let err = b
        .bookings
        .create_session(&stranger, b.student.user_id, b.counselor.user_id, form())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden { .. }));
}

#[tokio::test]
async fn test_disallowed_duration_is_a_validation_error() {
    let b = connected().await;
    let err = b
        .bookings
        .create_session(
            &b.student,
            b.student.user_id,
            b.counselor.user_id,
            form().with_duration(15),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_complete_records_rating_and_closes_session() {
    let b = connected().await;
    let session = b
        .bookings
        .create_session(&b.student, b.student.user_id, b.counselor.user_id, form())
        .await
        .unwrap();

    assert!(matches!(
        b.bookings
            .complete_session(&b.student, session.id, None, Some(4))
            .await,
        Err(CoreError::Forbidden { .. })
    ));
    assert!(matches!(
        b.bookings
            .complete_session(&b.counselor, session.id, None, Some(9))
            .await,
        Err(CoreError::Validation(_))
    ));

    let done = b
        .bookings
        .complete_session(&b.counselor, session.id, Some(" went well ".into()), Some(4))
        .await
        .unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.rating, Some(4));
    assert_eq!(done.completion_notes.as_deref(), Some("went well"));

    let err = b
        .bookings
        .cancel_session(&b.student, session.id, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::SessionClosed {
            status: SessionStatus::Completed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_participant_cancels_session() {
    let b = connected().await;
    let session = b
        .bookings
        .create_session(&b.student, b.student.user_id, b.counselor.user_id, form())
        .await
        .unwrap();

    let cancelled = b
        .bookings
        .cancel_session(&b.student, session.id, Some("exam clash".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);

    let stats = ConnectionService::new(b.fx.store.clone())
        .counselor_stats(b.counselor.user_id)
        .await
        .unwrap();
    assert_eq!(stats.scheduled_sessions, 0);
    assert_eq!(stats.completed_sessions, 0);
}

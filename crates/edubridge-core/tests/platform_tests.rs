use edubridge_core::{demo, Actor, EduBridge, EduBridgeConfig};
use edubridge_store::{ActivityKind, MemoryStore, SessionStatus};
use edubridge_test_utils::Fixture;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_demo_scenario_completes_a_session() {
    let store = Arc::new(MemoryStore::new());
    let cast = demo::seed(&store).await.unwrap();
    let platform = EduBridge::new(store, &EduBridgeConfig::default());

    let report = demo::run(&platform, &cast).await.unwrap();

    assert_eq!(report.session.status, SessionStatus::Completed);
    assert_eq!(report.session.rating, Some(5));
    let student_kinds: Vec<_> = report.student_feed.iter().map(|a| a.kind).collect();
    assert_eq!(
        student_kinds,
        vec![
            ActivityKind::SessionCompleted,
            ActivityKind::SessionScheduled,
            ActivityKind::ConnectionApproved,
            ActivityKind::ConnectionRequested,
        ]
    );
    assert!(report
        .counselor_feed
        .iter()
        .any(|a| a.kind == ActivityKind::StudentAssigned));
}

#[tokio::test]
async fn test_services_share_one_store() {
    let fx = Fixture::seeded(1, 1).await.with_catalog();
    let platform = EduBridge::new(fx.store.clone(), &EduBridgeConfig::default());
    let student = Actor::from_user(fx.student(0));

    platform
        .connections
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    assert_eq!(fx.store.request_count(), 1);

    let counselors = platform.directory.available_counselors().await.unwrap();
    assert_eq!(counselors.len(), 1);

    let stats = platform.catalog.statistics().await.unwrap();
    assert_eq!(stats.countries, 2);
    assert_eq!(stats.universities, 2);
    assert_eq!(stats.courses, 2);
    assert_eq!(stats.pathways, 1);

    let canada = platform.catalog.universities_by_country(1).await.unwrap();
    assert_eq!(canada.len(), 1);
    assert_eq!(canada[0].university_name, "University of Toronto");
}

#[tokio::test]
async fn test_cleanup_removes_student_requests() {
    let fx = Fixture::seeded(1, 1).await;
    let platform = EduBridge::new(fx.store.clone(), &EduBridgeConfig::default());
    let admin = Actor::from_user(&fx.admin);
    let student = Actor::from_user(fx.student(0));

    let request = platform
        .connections
        .submit_request(&student, fx.counselor_id(0), None)
        .await
        .unwrap();
    platform
        .connections
        .approve(request.id, &admin, None)
        .await
        .unwrap();

    let removed = platform
        .directory
        .cleanup_student_data(&admin, student.user_id)
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(platform
        .connections
        .student_requests(student.user_id)
        .await
        .unwrap()
        .is_empty());
    assert!(platform
        .connections
        .approved_students_for_counselor(fx.counselor_id(0))
        .await
        .unwrap()
        .is_empty());
}

//! Seeded in-memory marketplace for the CLI and smoke runs

use crate::actor::Actor;
use crate::booking::SessionForm;
use crate::error::CoreResult;
use crate::platform::EduBridge;
use chrono::{Duration, NaiveTime, Utc};
use edubridge_store::{
    Activity, Counselor, Country, Course, MemoryStore, NewUser, Pathway, RecordStore, Role,
    Session, SessionType, University,
};
use serde::Serialize;

/// Users created by [`seed`]
#[derive(Debug, Clone)]
pub struct DemoCast {
    /// Seeded admin
    pub admin: Actor,
    /// Seeded students
    pub students: Vec<Actor>,
    /// Seeded counselors
    pub counselors: Vec<Counselor>,
}

/// What the scripted scenario produced
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    /// Completed session
    pub session: Session,
    /// Activity feed of the booking student
    pub student_feed: Vec<Activity>,
    /// Activity feed of the hosting counselor
    pub counselor_feed: Vec<Activity>,
}

/// Populate `store` with an admin, two students, two counselors and a small catalog
pub async fn seed(store: &MemoryStore) -> CoreResult<DemoCast> {
    let admin = store
        .insert_user(NewUser::new("admin@edubridge.test", "Avery", "Admin", Role::Admin))
        .await?;

    let mut students = Vec::new();
    for (email, first, last) in [
        ("priya@edubridge.test", "Priya", "Shah"),
        ("tomas@edubridge.test", "Tomas", "Novak"),
    ] {
        let user = store
            .insert_user(NewUser::new(email, first, last, Role::Student))
            .await?;
        students.push(Actor::from_user(&user));
    }

    let mut counselors = Vec::new();
    for (email, first, last, focus) in [
        ("grace@edubridge.test", "Grace", "Okafor", ["UK admissions", "Scholarships"]),
        ("lars@edubridge.test", "Lars", "Berg", ["Germany", "Engineering"]),
    ] {
        let user = store
            .insert_user(NewUser::new(email, first, last, Role::Counselor))
            .await?;
        counselors.push(
            store
                .upsert_counselor(Counselor::for_user(&user).with_specializations(focus))
                .await?,
        );
    }

    store.load_catalog(
        vec![
            Country {
                country_id: 1,
                country_name: "Germany".into(),
                country_code: Some("DE".into()),
            },
            Country {
                country_id: 2,
                country_name: "United Kingdom".into(),
                country_code: Some("GB".into()),
            },
        ],
        vec![
            University {
                id: 1,
                university_name: "Technical University of Munich".into(),
                city: Some("Munich".into()),
                state_province: Some("Bavaria".into()),
                country_id: 1,
                university_type: Some("public".into()),
            },
            University {
                id: 2,
                university_name: "University of Edinburgh".into(),
                city: Some("Edinburgh".into()),
                state_province: Some("Scotland".into()),
                country_id: 2,
                university_type: Some("public".into()),
            },
        ],
        vec![
            Course {
                id: 1,
                program_name: "Mechanical Engineering".into(),
                university_id: 1,
                degree_level: Some("Master".into()),
            },
            Course {
                id: 2,
                program_name: "Informatics".into(),
                university_id: 2,
                degree_level: Some("Bachelor".into()),
            },
        ],
        vec![Pathway {
            id: 1,
            name: "Foundation Year".into(),
            description: Some("Preparatory year before undergraduate study".into()),
        }],
    );

    tracing::info!(
        students = students.len(),
        counselors = counselors.len(),
        "demo store seeded"
    );
    Ok(DemoCast {
        admin: Actor::from_user(&admin),
        students,
        counselors,
    })
}

/// Submit, approve, book and complete a session for the first student
pub async fn run(platform: &EduBridge<MemoryStore>, cast: &DemoCast) -> CoreResult<DemoReport> {
    let (Some(student), Some(counselor)) = (cast.students.first(), cast.counselors.first()) else {
        return Err(crate::error::ValidationError::MissingField("demo cast").into());
    };

    let request = platform
        .connections
        .submit_request(
            student,
            counselor.user_id,
            Some("Applying for a master's in the UK".into()),
        )
        .await?;
    platform
        .connections
        .approve(request.id, &cast.admin, Some("Good fit".into()))
        .await?;

    let counselor_actor = Actor::load(&**platform.store(), counselor.user_id).await?;
    let date = (Utc::now() + Duration::days(7)).date_naive();
    let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default();
    let session = platform
        .bookings
        .create_session(
            &counselor_actor,
            student.user_id,
            counselor.user_id,
            SessionForm::new("Shortlist review", date, time).with_type(SessionType::DocumentReview),
        )
        .await?;
    let session = platform
        .bookings
        .complete_session(
            &counselor_actor,
            session.id,
            Some("Shortlist agreed".into()),
            Some(5),
        )
        .await?;

    Ok(DemoReport {
        session,
        student_feed: platform.connections.activity_feed(student.user_id).await?,
        counselor_feed: platform.connections.activity_feed(counselor.user_id).await?,
    })
}

//! Postgres backend
//!
//! Statuses and kinds are stored as TEXT and decoded through the closed
//! enums, so an unexpected value surfaces as [`StoreError::Decode`] rather
//! than a silently wrong record.
//!
//! The single-active-request rule is the partial unique index
//! `counselor_requests_one_active_per_student`; status transitions are
//! `UPDATE ... WHERE status = $expected`.

use crate::error::{StoreError, StoreResult};
use crate::model::{
    Activity, ActivityId, Counselor, CounselorRequest, Country, Course, NewCounselorRequest,
    NewSession, NewUser, Pathway, RequestId, RequestStatus, RosterEntry, Session, SessionId,
    SessionUpdate, StatusPatch, University, User, UserId,
};
use crate::store::{CatalogSource, RecordStore};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

const REQUEST_COLUMNS: &str = "id, student_id, requested_counselor_id, status, request_reason, \
     created_at, updated_at, approved_at, approved_by, rejected_at, rejected_by, cancelled_at, \
     admin_notes, reassigned_from";

const SESSION_COLUMNS: &str = "id, student_id, counselor_id, session_type, session_title, \
     session_description, scheduled_date, scheduled_time, duration_minutes, meeting_link, notes, \
     status, completion_notes, rating, created_at, updated_at, completed_at";

const USER_COLUMNS: &str = "id, email, first_name, last_name, role, phone, nationality, \
     current_location, education_level, field_of_study, target_countries, created_at";

const COUNSELOR_COLUMNS: &str = "user_id, email, first_name, last_name, specializations, \
     counselor_type, is_available, hourly_rate, average_rating, total_reviews";

/// Record store backed by a Postgres pool
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool to `url`
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled SQL migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
        tracing::info!("migrations applied");
        Ok(())
    }

    async fn active_request_id(&self, student_id: UserId) -> StoreResult<Option<RequestId>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM counselor_requests \
             WHERE student_id = $1 AND status IN ('pending', 'approved') LIMIT 1",
        )
        .bind(student_id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id.map(RequestId))
    }

    async fn fetch_requests(
        &self,
        filter: &str,
        arg: Option<Uuid>,
        status: Option<RequestStatus>,
    ) -> StoreResult<Vec<CounselorRequest>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM counselor_requests {filter} ORDER BY created_at DESC"
        );
        let mut query = sqlx::query_as::<_, RequestRow>(&sql);
        if let Some(arg) = arg {
            query = query.bind(arg);
        }
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CounselorRequest::try_from)
            .collect()
    }

    async fn fetch_sessions(&self, column: &str, id: UserId) -> StoreResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE {column} = $1 \
             ORDER BY scheduled_date, scheduled_time"
        );
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id.0)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Session::try_from)
            .collect()
    }

    /// Stale or missing, after a conditional update matched no row
    async fn explain_missed_update(
        &self,
        id: RequestId,
        expected: RequestStatus,
    ) -> StoreError {
        match self.get_request(id).await {
            Ok(current) => StoreError::StaleStatus {
                id,
                expected,
                actual: current.status,
            },
            Err(e) => e,
        }
    }
}

// CAS update shared by status changes and reassignment. Stamps follow the
// same rules as `StatusPatch::apply`.
const UPDATE_STATUS_SQL: &str = "UPDATE counselor_requests SET \
     status = $3::text, \
     updated_at = $4, \
     approved_at = CASE WHEN $3::text = 'approved' THEN $4 ELSE approved_at END, \
     approved_by = CASE WHEN $3::text = 'approved' THEN $5 ELSE approved_by END, \
     rejected_at = CASE WHEN $3::text = 'rejected' THEN $4 ELSE rejected_at END, \
     rejected_by = CASE WHEN $3::text = 'rejected' THEN $5 ELSE rejected_by END, \
     cancelled_at = CASE WHEN $3::text = 'cancelled' THEN $4 ELSE cancelled_at END, \
     admin_notes = COALESCE($6, admin_notes) \
     WHERE id = $1 AND status = $2 \
     RETURNING id, student_id, requested_counselor_id, status, request_reason, created_at, \
     updated_at, approved_at, approved_by, rejected_at, rejected_by, cancelled_at, admin_notes, \
     reassigned_from";

const INSERT_REQUEST_SQL: &str = "INSERT INTO counselor_requests \
     (id, student_id, requested_counselor_id, status, request_reason, created_at, updated_at, \
      reassigned_from) \
     VALUES ($1, $2, $3, 'pending', $4, $5, $5, $6) \
     ON CONFLICT (student_id) WHERE status IN ('pending', 'approved') DO NOTHING \
     RETURNING id, student_id, requested_counselor_id, status, request_reason, created_at, \
     updated_at, approved_at, approved_by, rejected_at, rejected_by, cancelled_at, admin_notes, \
     reassigned_from";

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user(UserId::new(), Utc::now());
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.0)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.role.as_str())
            .bind(&user.phone)
            .bind(&user.nationality)
            .bind(&user.current_location)
            .bind(&user.education_level)
            .bind(&user.field_of_study)
            .bind(&user.target_countries)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Duplicate(format!("email {}", user.email))
                }
                other => other.into(),
            })?;
        row.try_into()
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))?
            .try_into()
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        let email = email.trim().to_lowercase();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("user", &email))?
            .try_into()
    }

    async fn all_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn upsert_counselor(&self, counselor: Counselor) -> StoreResult<Counselor> {
        let sql = format!(
            "INSERT INTO counselors ({COUNSELOR_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (user_id) DO UPDATE SET \
               email = EXCLUDED.email, first_name = EXCLUDED.first_name, \
               last_name = EXCLUDED.last_name, specializations = EXCLUDED.specializations, \
               counselor_type = EXCLUDED.counselor_type, is_available = EXCLUDED.is_available, \
               hourly_rate = EXCLUDED.hourly_rate, average_rating = EXCLUDED.average_rating, \
               total_reviews = EXCLUDED.total_reviews \
             RETURNING {COUNSELOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CounselorRow>(&sql)
            .bind(counselor.user_id.0)
            .bind(&counselor.email)
            .bind(&counselor.first_name)
            .bind(&counselor.last_name)
            .bind(&counselor.specializations)
            .bind(&counselor.counselor_type)
            .bind(counselor.is_available)
            .bind(counselor.hourly_rate)
            .bind(counselor.average_rating)
            .bind(counselor.total_reviews)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::not_found("user", counselor.user_id)
                }
                other => other.into(),
            })?;
        Ok(row.into())
    }

    async fn get_counselor(&self, id: UserId) -> StoreResult<Counselor> {
        let sql = format!("SELECT {COUNSELOR_COLUMNS} FROM counselors WHERE user_id = $1");
        sqlx::query_as::<_, CounselorRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(Counselor::from)
            .ok_or_else(|| StoreError::not_found("counselor", id))
    }

    async fn get_counselor_by_email(&self, email: &str) -> StoreResult<Counselor> {
        let email = email.trim().to_lowercase();
        let sql = format!("SELECT {COUNSELOR_COLUMNS} FROM counselors WHERE lower(email) = $1");
        sqlx::query_as::<_, CounselorRow>(&sql)
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .map(Counselor::from)
            .ok_or_else(|| StoreError::not_found("counselor", &email))
    }

    async fn all_counselors(&self) -> StoreResult<Vec<Counselor>> {
        let sql = format!(
            "SELECT {COUNSELOR_COLUMNS} FROM counselors ORDER BY last_name, first_name, user_id"
        );
        Ok(sqlx::query_as::<_, CounselorRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Counselor::from)
            .collect())
    }

    async fn set_counselor_availability(
        &self,
        id: UserId,
        is_available: bool,
    ) -> StoreResult<Counselor> {
        let sql = format!(
            "UPDATE counselors SET is_available = $2 WHERE user_id = $1 \
             RETURNING {COUNSELOR_COLUMNS}"
        );
        sqlx::query_as::<_, CounselorRow>(&sql)
            .bind(id.0)
            .bind(is_available)
            .fetch_optional(&self.pool)
            .await?
            .map(Counselor::from)
            .ok_or_else(|| StoreError::not_found("counselor", id))
    }

    async fn create_request_if_no_active(
        &self,
        request: NewCounselorRequest,
    ) -> StoreResult<CounselorRequest> {
        let student_id = request.student_id;
        let row = sqlx::query_as::<_, RequestRow>(INSERT_REQUEST_SQL)
            .bind(Uuid::new_v4())
            .bind(student_id.0)
            .bind(request.requested_counselor_id.0)
            .bind(&request.request_reason)
            .bind(Utc::now())
            .bind(request.reassigned_from.map(|r| r.0))
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into(),
            None => {
                // The index rejected the insert; report which request holds the slot.
                let existing = self
                    .active_request_id(student_id)
                    .await?
                    .ok_or_else(|| StoreError::Backend("active request vanished".into()))?;
                Err(StoreError::ActiveRequestExists {
                    student_id,
                    existing,
                })
            }
        }
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<CounselorRequest> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM counselor_requests WHERE id = $1");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("counselor request", id))?
            .try_into()
    }

    async fn all_requests(&self) -> StoreResult<Vec<CounselorRequest>> {
        self.fetch_requests("", None, None).await
    }

    async fn requests_by_status(
        &self,
        status: RequestStatus,
    ) -> StoreResult<Vec<CounselorRequest>> {
        self.fetch_requests("WHERE status = $1", None, Some(status))
            .await
    }

    async fn requests_by_student(&self, student_id: UserId) -> StoreResult<Vec<CounselorRequest>> {
        self.fetch_requests("WHERE student_id = $1", Some(student_id.0), None)
            .await
    }

    async fn requests_by_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<CounselorRequest>> {
        self.fetch_requests("WHERE requested_counselor_id = $1", Some(counselor_id.0), None)
            .await
    }

    async fn update_request_if_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
    ) -> StoreResult<CounselorRequest> {
        let row = sqlx::query_as::<_, RequestRow>(UPDATE_STATUS_SQL)
            .bind(id.0)
            .bind(expected.as_str())
            .bind(patch.status.as_str())
            .bind(patch.at)
            .bind(patch.actor.0)
            .bind(&patch.admin_notes)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(self.explain_missed_update(id, expected).await),
        }
    }

    async fn reassign_request(
        &self,
        id: RequestId,
        expected: RequestStatus,
        patch: StatusPatch,
        new_counselor: UserId,
    ) -> StoreResult<(CounselorRequest, CounselorRequest)> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query_as::<_, RequestRow>(UPDATE_STATUS_SQL)
            .bind(id.0)
            .bind(expected.as_str())
            .bind(patch.status.as_str())
            .bind(patch.at)
            .bind(patch.actor.0)
            .bind(&patch.admin_notes)
            .fetch_optional(&mut *tx)
            .await?;
        let closed: CounselorRequest = match closed {
            Some(row) => row.try_into()?,
            None => {
                tx.rollback().await?;
                return Err(self.explain_missed_update(id, expected).await);
            }
        };

        let successor = sqlx::query_as::<_, RequestRow>(INSERT_REQUEST_SQL)
            .bind(Uuid::new_v4())
            .bind(closed.student_id.0)
            .bind(new_counselor.0)
            .bind(&closed.request_reason)
            .bind(patch.at)
            .bind(Some(closed.id.0))
            .fetch_optional(&mut *tx)
            .await?;
        let successor: CounselorRequest = match successor {
            Some(row) => row.try_into()?,
            None => {
                tx.rollback().await?;
                return Err(StoreError::Backend(format!(
                    "student {} gained another active request during reassignment",
                    closed.student_id
                )));
            }
        };

        tx.commit().await?;
        Ok((closed, successor))
    }

    async fn delete_requests_for_student(&self, student_id: UserId) -> StoreResult<u64> {
        // Successors reference their originals, so drop the links first.
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE counselor_requests SET reassigned_from = NULL WHERE student_id = $1")
            .bind(student_id.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM counselor_requests WHERE student_id = $1")
            .bind(student_id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn approved_students_for_counselor(
        &self,
        counselor_id: UserId,
    ) -> StoreResult<Vec<RosterEntry>> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM counselor_requests \
             WHERE requested_counselor_id = $1 AND status = 'approved' \
             ORDER BY approved_at DESC"
        );
        let requests: Vec<CounselorRequest> = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(counselor_id.0)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CounselorRequest::try_from)
            .collect::<StoreResult<_>>()?;
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = requests.iter().map(|r| r.student_id.0).collect();
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let mut students: HashMap<UserId, User> = HashMap::new();
        for row in sqlx::query_as::<_, UserRow>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
        {
            let user = User::try_from(row)?;
            students.insert(user.id, user);
        }

        let mut roster = Vec::with_capacity(requests.len());
        for request in requests {
            match students.get(&request.student_id) {
                Some(student) => roster.push(RosterEntry {
                    student: student.clone(),
                    request,
                }),
                None => tracing::warn!(
                    request_id = %request.id,
                    student_id = %request.student_id,
                    "approved request references a missing student"
                ),
            }
        }
        Ok(roster)
    }

    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let session = session.into_session(SessionId::new(), Utc::now());
        let sql = format!(
            "INSERT INTO sessions ({SESSION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session.id.0)
            .bind(session.student_id.0)
            .bind(session.counselor_id.0)
            .bind(session.session_type.as_str())
            .bind(&session.session_title)
            .bind(&session.session_description)
            .bind(session.scheduled_date)
            .bind(session.scheduled_time)
            .bind(duration_column(session.duration_minutes)?)
            .bind(&session.meeting_link)
            .bind(&session.notes)
            .bind(session.status.as_str())
            .bind(&session.completion_notes)
            .bind(session.rating.map(i16::from))
            .bind(session.created_at)
            .bind(session.updated_at)
            .bind(session.completed_at)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Session> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("session", id))?
            .try_into()
    }

    async fn update_session(&self, id: SessionId, update: SessionUpdate) -> StoreResult<Session> {
        let sql = format!(
            "UPDATE sessions SET \
               status = $2::text, \
               updated_at = $3, \
               completed_at = CASE WHEN $2::text = 'completed' THEN $3 ELSE completed_at END, \
               notes = COALESCE($4, notes), \
               completion_notes = COALESCE($5, completion_notes), \
               rating = COALESCE($6, rating) \
             WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&sql)
            .bind(id.0)
            .bind(update.status.as_str())
            .bind(update.at)
            .bind(&update.notes)
            .bind(&update.completion_notes)
            .bind(update.rating.map(i16::from))
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("session", id))?
            .try_into()
    }

    async fn sessions_for_counselor(&self, counselor_id: UserId) -> StoreResult<Vec<Session>> {
        self.fetch_sessions("counselor_id", counselor_id).await
    }

    async fn sessions_for_student(&self, student_id: UserId) -> StoreResult<Vec<Session>> {
        self.fetch_sessions("student_id", student_id).await
    }

    async fn append_activity(&self, activity: Activity) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO user_activities (id, user_id, activity_type, description, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(activity.id.0)
        .bind(activity.user_id.0)
        .bind(activity.kind.as_str())
        .bind(&activity.description)
        .bind(activity.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn activities_for_user(&self, user_id: UserId) -> StoreResult<Vec<Activity>> {
        sqlx::query_as::<_, ActivityRow>(
            "SELECT id, user_id, activity_type, description, created_at FROM user_activities \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Activity::try_from)
        .collect()
    }
}

#[async_trait]
impl CatalogSource for PgStore {
    async fn countries(&self) -> StoreResult<Vec<Country>> {
        Ok(sqlx::query_as::<_, CountryRow>(
            "SELECT country_id, country_name, country_code FROM n_countries ORDER BY country_name",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Country::from)
        .collect())
    }

    async fn universities(&self) -> StoreResult<Vec<University>> {
        Ok(sqlx::query_as::<_, UniversityRow>(
            "SELECT id, university_name, city, state_province, country_id, university_type \
             FROM new_universities ORDER BY university_name",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(University::from)
        .collect())
    }

    async fn courses(&self) -> StoreResult<Vec<Course>> {
        Ok(sqlx::query_as::<_, CourseRow>(
            "SELECT id, program_name, university_id, degree_level FROM new_courses \
             ORDER BY program_name",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Course::from)
        .collect())
    }

    async fn pathways(&self) -> StoreResult<Vec<Pathway>> {
        Ok(sqlx::query_as::<_, PathwayRow>(
            "SELECT id, name, description FROM pathways ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Pathway::from)
        .collect())
    }
}

// ---- row mapping ----

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    phone: Option<String>,
    nationality: Option<String>,
    current_location: Option<String>,
    education_level: Option<String>,
    field_of_study: Option<String>,
    target_countries: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(Self {
            id: UserId(row.id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role.parse()?,
            phone: row.phone,
            nationality: row.nationality,
            current_location: row.current_location,
            education_level: row.education_level,
            field_of_study: row.field_of_study,
            target_countries: row.target_countries,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CounselorRow {
    user_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    specializations: Vec<String>,
    counselor_type: Option<String>,
    is_available: bool,
    hourly_rate: Option<f64>,
    average_rating: f64,
    total_reviews: i32,
}

impl From<CounselorRow> for Counselor {
    fn from(row: CounselorRow) -> Self {
        Self {
            user_id: UserId(row.user_id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            specializations: row.specializations,
            counselor_type: row.counselor_type,
            is_available: row.is_available,
            hourly_rate: row.hourly_rate,
            average_rating: row.average_rating,
            total_reviews: row.total_reviews,
        }
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: Uuid,
    student_id: Uuid,
    requested_counselor_id: Uuid,
    status: String,
    request_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    approved_by: Option<Uuid>,
    rejected_at: Option<DateTime<Utc>>,
    rejected_by: Option<Uuid>,
    cancelled_at: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
    reassigned_from: Option<Uuid>,
}

impl TryFrom<RequestRow> for CounselorRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> StoreResult<Self> {
        Ok(Self {
            id: RequestId(row.id),
            student_id: UserId(row.student_id),
            requested_counselor_id: UserId(row.requested_counselor_id),
            status: row.status.parse()?,
            request_reason: row.request_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
            approved_at: row.approved_at,
            approved_by: row.approved_by.map(UserId),
            rejected_at: row.rejected_at,
            rejected_by: row.rejected_by.map(UserId),
            cancelled_at: row.cancelled_at,
            admin_notes: row.admin_notes,
            reassigned_from: row.reassigned_from.map(RequestId),
        })
    }
}

/// `duration_minutes` is an `INTEGER` column
fn duration_column(minutes: u32) -> StoreResult<i32> {
    i32::try_from(minutes)
        .map_err(|_| StoreError::Decode(format!("duration of {minutes} minutes does not fit the column")))
}

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    student_id: Uuid,
    counselor_id: Uuid,
    session_type: String,
    session_title: String,
    session_description: Option<String>,
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    duration_minutes: i32,
    meeting_link: Option<String>,
    notes: Option<String>,
    status: String,
    completion_notes: Option<String>,
    rating: Option<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> StoreResult<Self> {
        let duration_minutes = u32::try_from(row.duration_minutes)
            .map_err(|_| StoreError::Decode(format!("negative duration {}", row.duration_minutes)))?;
        let rating = row
            .rating
            .map(u8::try_from)
            .transpose()
            .map_err(|_| StoreError::Decode(format!("rating out of range: {:?}", row.rating)))?;
        Ok(Self {
            id: SessionId(row.id),
            student_id: UserId(row.student_id),
            counselor_id: UserId(row.counselor_id),
            session_type: row.session_type.parse()?,
            session_title: row.session_title,
            session_description: row.session_description,
            scheduled_date: row.scheduled_date,
            scheduled_time: row.scheduled_time,
            duration_minutes,
            meeting_link: row.meeting_link,
            notes: row.notes,
            status: row.status.parse()?,
            completion_notes: row.completion_notes,
            rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    activity_type: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = StoreError;

    fn try_from(row: ActivityRow) -> StoreResult<Self> {
        Ok(Self {
            id: ActivityId(row.id),
            user_id: UserId(row.user_id),
            kind: row.activity_type.parse()?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct CountryRow {
    country_id: i64,
    country_name: String,
    country_code: Option<String>,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Self {
            country_id: row.country_id,
            country_name: row.country_name,
            country_code: row.country_code,
        }
    }
}

#[derive(FromRow)]
struct UniversityRow {
    id: i64,
    university_name: String,
    city: Option<String>,
    state_province: Option<String>,
    country_id: i64,
    university_type: Option<String>,
}

impl From<UniversityRow> for University {
    fn from(row: UniversityRow) -> Self {
        Self {
            id: row.id,
            university_name: row.university_name,
            city: row.city,
            state_province: row.state_province,
            country_id: row.country_id,
            university_type: row.university_type,
        }
    }
}

#[derive(FromRow)]
struct CourseRow {
    id: i64,
    program_name: String,
    university_id: i64,
    degree_level: Option<String>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            program_name: row.program_name,
            university_id: row.university_id,
            degree_level: row.degree_level,
        }
    }
}

#[derive(FromRow)]
struct PathwayRow {
    id: i64,
    name: String,
    description: Option<String>,
}

impl From<PathwayRow> for Pathway {
    fn from(row: PathwayRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

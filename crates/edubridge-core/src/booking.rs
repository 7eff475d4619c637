//! Session booking
//!
//! Sessions are booked only between a student and a counselor with an
//! approved connection. Overlapping bookings are not detected.

use crate::actor::Actor;
use crate::config::BookingConfig;
use crate::connection::record_activity;
use crate::error::{CoreError, CoreResult, ValidationError};
use chrono::{NaiveDate, NaiveTime, Utc};
use edubridge_store::{
    ActivityKind, NewSession, RecordStore, RequestStatus, Session, SessionId, SessionStatus,
    SessionType, SessionUpdate, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lowest and highest accepted session rating
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Booking form as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionForm {
    /// Session category
    pub session_type: SessionType,
    /// Short title, required
    pub session_title: String,
    /// Agenda
    pub session_description: Option<String>,
    /// Calendar day, required
    pub scheduled_date: Option<NaiveDate>,
    /// Start time, required
    pub scheduled_time: Option<NaiveTime>,
    /// Falls back to the configured default
    pub duration_minutes: Option<u32>,
    /// Video call URL
    pub meeting_link: Option<String>,
    /// Booking notes
    pub notes: Option<String>,
}

impl SessionForm {
    /// Form with the required fields filled
    pub fn new(title: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            session_title: title.into(),
            scheduled_date: Some(date),
            scheduled_time: Some(time),
            ..Self::default()
        }
    }

    /// Set session type
    #[must_use]
    pub fn with_type(mut self, session_type: SessionType) -> Self {
        self.session_type = session_type;
        self
    }

    /// Set duration
    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    /// Set meeting link
    #[must_use]
    pub fn with_meeting_link(mut self, link: impl Into<String>) -> Self {
        self.meeting_link = Some(link.into());
        self
    }

    /// Set notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check required fields and duration, producing the insert payload
    pub fn validate(
        self,
        student_id: UserId,
        counselor_id: UserId,
        policy: &BookingConfig,
    ) -> Result<NewSession, ValidationError> {
        let title = self.session_title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("session_title"));
        }
        let scheduled_date = self
            .scheduled_date
            .ok_or(ValidationError::MissingField("scheduled_date"))?;
        let scheduled_time = self
            .scheduled_time
            .ok_or(ValidationError::MissingField("scheduled_time"))?;

        let duration_minutes = self
            .duration_minutes
            .unwrap_or(policy.default_duration_minutes);
        if !policy.allowed_durations.contains(&duration_minutes) {
            return Err(ValidationError::invalid(
                "duration_minutes",
                format!(
                    "{duration_minutes} is not one of {:?}",
                    policy.allowed_durations
                ),
            ));
        }
        if student_id == counselor_id {
            return Err(ValidationError::invalid(
                "counselor_id",
                "student and counselor must differ",
            ));
        }

        Ok(NewSession {
            student_id,
            counselor_id,
            session_type: self.session_type,
            session_title: title.to_string(),
            session_description: non_blank(self.session_description),
            scheduled_date,
            scheduled_time,
            duration_minutes,
            meeting_link: non_blank(self.meeting_link),
            notes: non_blank(self.notes),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Session booking over a record store
#[derive(Debug)]
pub struct BookingService<S: ?Sized> {
    store: Arc<S>,
    policy: BookingConfig,
}

impl<S: ?Sized> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
        }
    }
}

impl<S: RecordStore + ?Sized> BookingService<S> {
    /// Create service over `store` with booking rules
    #[must_use]
    pub fn new(store: Arc<S>, policy: BookingConfig) -> Self {
        Self { store, policy }
    }

    /// Booking rules in force
    #[must_use]
    pub fn policy(&self) -> &BookingConfig {
        &self.policy
    }

    /// Book a session between a student and a counselor
    ///
    /// The actor must be one of the two participants or an admin.
    ///
    /// # Errors
    /// - `CoreError::Validation` for missing title, date or time, or a
    ///   duration outside the allowed set
    /// - `CoreError::NoApprovedConnection` unless the pair has an approved
    ///   request
    pub async fn create_session(
        &self,
        actor: &Actor,
        student_id: UserId,
        counselor_id: UserId,
        form: SessionForm,
    ) -> CoreResult<Session> {
        let actor = actor.refresh(&*self.store).await?;
        let participant = actor.user_id == student_id || actor.user_id == counselor_id;
        if !participant && !actor.is_admin() {
            return Err(CoreError::forbidden(
                actor.user_id,
                actor.role,
                "book sessions for other users",
            ));
        }

        let new = form.validate(student_id, counselor_id, &self.policy)?;

        let approved = self
            .store
            .requests_by_student(student_id)
            .await?
            .iter()
            .any(|r| r.status == RequestStatus::Approved && r.requested_counselor_id == counselor_id);
        if !approved {
            tracing::warn!(
                student_id = %student_id,
                counselor_id = %counselor_id,
                "booking refused without approved connection"
            );
            return Err(CoreError::NoApprovedConnection {
                student_id,
                counselor_id,
            });
        }

        let session = self.store.insert_session(new).await.map_err(|e| {
            tracing::error!(student_id = %student_id, counselor_id = %counselor_id, "session insert failed: {e}");
            e
        })?;

        tracing::info!(
            session_id = %session.id,
            student_id = %student_id,
            counselor_id = %counselor_id,
            date = %session.scheduled_date,
            time = %session.scheduled_time,
            "session scheduled"
        );
        let description = format!(
            "{} scheduled for {} at {}",
            session.session_type.label(),
            session.scheduled_date,
            session.scheduled_time.format("%H:%M")
        );
        for user_id in [student_id, counselor_id] {
            record_activity(
                &*self.store,
                user_id,
                ActivityKind::SessionScheduled,
                description.clone(),
            )
            .await;
        }

        Ok(session)
    }

    /// Mark a scheduled session completed, with optional notes and a 1-5 rating
    pub async fn complete_session(
        &self,
        actor: &Actor,
        session_id: SessionId,
        completion_notes: Option<String>,
        rating: Option<u8>,
    ) -> CoreResult<Session> {
        if let Some(rating) = rating {
            if !RATING_RANGE.contains(&rating) {
                return Err(ValidationError::invalid(
                    "rating",
                    format!("{rating} is outside {}..={}", RATING_RANGE.start(), RATING_RANGE.end()),
                )
                .into());
            }
        }

        let actor = actor.refresh(&*self.store).await?;
        let session = self.scheduled_session(session_id).await?;
        if actor.user_id != session.counselor_id && !actor.is_admin() {
            return Err(CoreError::forbidden(
                actor.user_id,
                actor.role,
                "complete another counselor's session",
            ));
        }

        let mut update = SessionUpdate::new(SessionStatus::Completed, Utc::now());
        update.completion_notes = non_blank(completion_notes);
        update.rating = rating;
        let session = self.store.update_session(session_id, update).await?;

        tracing::info!(session_id = %session_id, rating = ?rating, "session completed");
        for user_id in [session.student_id, session.counselor_id] {
            record_activity(
                &*self.store,
                user_id,
                ActivityKind::SessionCompleted,
                format!("Completed session: {}", session.session_title),
            )
            .await;
        }
        Ok(session)
    }

    /// Cancel a scheduled session
    pub async fn cancel_session(
        &self,
        actor: &Actor,
        session_id: SessionId,
        reason: Option<String>,
    ) -> CoreResult<Session> {
        let actor = actor.refresh(&*self.store).await?;
        let session = self.scheduled_session(session_id).await?;
        let participant =
            actor.user_id == session.student_id || actor.user_id == session.counselor_id;
        if !participant && !actor.is_admin() {
            return Err(CoreError::forbidden(
                actor.user_id,
                actor.role,
                "cancel another user's session",
            ));
        }

        let mut update = SessionUpdate::new(SessionStatus::Cancelled, Utc::now());
        update.notes = non_blank(reason);
        let session = self.store.update_session(session_id, update).await?;

        tracing::info!(session_id = %session_id, cancelled_by = %actor.user_id, "session cancelled");
        for user_id in [session.student_id, session.counselor_id] {
            record_activity(
                &*self.store,
                user_id,
                ActivityKind::SessionCancelled,
                format!("Cancelled session: {}", session.session_title),
            )
            .await;
        }
        Ok(session)
    }

    /// Session by id
    pub async fn session(&self, session_id: SessionId) -> CoreResult<Session> {
        Ok(self.store.get_session(session_id).await?)
    }

    /// A counselor's sessions ordered by date and time
    pub async fn sessions_for_counselor(&self, counselor_id: UserId) -> CoreResult<Vec<Session>> {
        Ok(self.store.sessions_for_counselor(counselor_id).await?)
    }

    /// A student's sessions ordered by date and time
    pub async fn sessions_for_student(&self, student_id: UserId) -> CoreResult<Vec<Session>> {
        Ok(self.store.sessions_for_student(student_id).await?)
    }

    async fn scheduled_session(&self, session_id: SessionId) -> CoreResult<Session> {
        let session = self.store.get_session(session_id).await?;
        if session.status != SessionStatus::Scheduled {
            return Err(CoreError::SessionClosed {
                id: session_id,
                status: session.status,
            });
        }
        Ok(session)
    }
}

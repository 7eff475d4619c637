use super::{uuid_id, UnknownVariant, UserId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

uuid_id!(
    /// Counseling session identifier
    SessionId
);

/// Kind of counseling session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Initial consultation
    #[default]
    Consultation,
    /// Document review
    DocumentReview,
    /// Application assistance
    ApplicationHelp,
    /// Interview preparation
    InterviewPrep,
    /// Follow-up meeting
    FollowUp,
}

impl SessionType {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::DocumentReview => "document_review",
            Self::ApplicationHelp => "application_help",
            Self::InterviewPrep => "interview_prep",
            Self::FollowUp => "follow_up",
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Consultation => "Initial Consultation",
            Self::DocumentReview => "Document Review",
            Self::ApplicationHelp => "Application Assistance",
            Self::InterviewPrep => "Interview Preparation",
            Self::FollowUp => "Follow-up Meeting",
        }
    }
}

impl FromStr for SessionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consultation" => Ok(Self::Consultation),
            "document_review" => Ok(Self::DocumentReview),
            "application_help" => Ok(Self::ApplicationHelp),
            "interview_prep" => Ok(Self::InterviewPrep),
            "follow_up" => Ok(Self::FollowUp),
            other => Err(UnknownVariant::new("session type", other)),
        }
    }
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Booked and upcoming
    Scheduled,
    /// Held; may carry a rating
    Completed,
    /// Called off by a participant
    Cancelled,
}

impl SessionStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("session status", other)),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled meeting between a student and a counselor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session id
    pub id: SessionId,
    /// Attending student
    pub student_id: UserId,
    /// Hosting counselor
    pub counselor_id: UserId,
    /// Session category
    pub session_type: SessionType,
    /// Short title
    pub session_title: String,
    /// Agenda
    pub session_description: Option<String>,
    /// Calendar day
    pub scheduled_date: NaiveDate,
    /// Start time
    pub scheduled_time: NaiveTime,
    /// Length in minutes
    pub duration_minutes: u32,
    /// Video call URL
    pub meeting_link: Option<String>,
    /// Booking notes
    pub notes: Option<String>,
    /// Session status
    pub status: SessionStatus,
    /// Counselor summary after completion
    pub completion_notes: Option<String>,
    /// Rating given on completion
    pub rating: Option<u8>,
    /// Booking time
    pub created_at: DateTime<Utc>,
    /// Time of the last change
    pub updated_at: DateTime<Utc>,
    /// Set when completed
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validated insert payload for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    /// Attending student
    pub student_id: UserId,
    /// Hosting counselor
    pub counselor_id: UserId,
    /// Session category
    pub session_type: SessionType,
    /// Short title
    pub session_title: String,
    /// Agenda
    pub session_description: Option<String>,
    /// Calendar day
    pub scheduled_date: NaiveDate,
    /// Start time
    pub scheduled_time: NaiveTime,
    /// Length in minutes
    pub duration_minutes: u32,
    /// Video call URL
    pub meeting_link: Option<String>,
    /// Booking notes
    pub notes: Option<String>,
}

impl NewSession {
    /// Materialize as a scheduled record
    #[must_use]
    pub fn into_session(self, id: SessionId, now: DateTime<Utc>) -> Session {
        Session {
            id,
            student_id: self.student_id,
            counselor_id: self.counselor_id,
            session_type: self.session_type,
            session_title: self.session_title,
            session_description: self.session_description,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            duration_minutes: self.duration_minutes,
            meeting_link: self.meeting_link,
            notes: self.notes,
            status: SessionStatus::Scheduled,
            completion_notes: None,
            rating: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Partial update for a session; `None` fields are left untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// Session status
    pub status: SessionStatus,
    /// Stamp for `updated_at`
    pub at: DateTime<Utc>,
    /// Booking notes
    pub notes: Option<String>,
    /// Counselor summary after completion
    pub completion_notes: Option<String>,
    /// Rating given on completion
    pub rating: Option<u8>,
}

impl SessionUpdate {
    /// Update moving a session to `status`
    #[must_use]
    pub fn new(status: SessionStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            at,
            notes: None,
            completion_notes: None,
            rating: None,
        }
    }

    /// Write the update into a record
    pub fn apply(&self, session: &mut Session) {
        session.status = self.status;
        session.updated_at = self.at;
        if self.status == SessionStatus::Completed {
            session.completed_at = Some(self.at);
        }
        if let Some(notes) = &self.notes {
            session.notes = Some(notes.clone());
        }
        if let Some(notes) = &self.completion_notes {
            session.completion_notes = Some(notes.clone());
        }
        if self.rating.is_some() {
            session.rating = self.rating;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_type_defaults_to_consultation() {
        assert_eq!(SessionType::default(), SessionType::Consultation);
        assert_eq!(
            "interview_prep".parse::<SessionType>().unwrap(),
            SessionType::InterviewPrep
        );
    }

    #[test]
    fn completing_stamps_completed_at() {
        let new = NewSession {
            student_id: UserId::new(),
            counselor_id: UserId::new(),
            session_type: SessionType::FollowUp,
            session_title: "Check-in".to_string(),
            session_description: None,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            duration_minutes: 30,
            meeting_link: None,
            notes: Some("bring transcript".to_string()),
        };
        let mut session = new.into_session(SessionId::new(), Utc::now());
        let mut update = SessionUpdate::new(SessionStatus::Completed, Utc::now());
        update.rating = Some(5);
        update.apply(&mut session);

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.completed_at.is_some());
        assert_eq!(session.rating, Some(5));
        assert_eq!(session.notes.as_deref(), Some("bring transcript"));
    }
}

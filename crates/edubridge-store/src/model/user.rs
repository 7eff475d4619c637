use super::{uuid_id, UnknownVariant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

uuid_id!(
    /// Identity anchor for students, counselors and admins
    UserId
);

/// Role tag carried by every user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Browses the catalog and requests counselors
    Student,
    /// Guides approved students
    Counselor,
    /// Decides connection requests
    Admin,
}

impl Role {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Counselor => "counselor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "counselor" => Ok(Self::Counselor),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Login email, unique
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    pub role: Role,
    /// Contact number
    pub phone: Option<String>,
    /// Nationality
    pub nationality: Option<String>,
    /// Where the user lives now
    pub current_location: Option<String>,
    /// Highest completed level
    pub education_level: Option<String>,
    /// Subject area
    pub field_of_study: Option<String>,
    /// Comma-separated destination countries
    pub target_countries: Option<String>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", or the email when both names are blank
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Insert payload for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// Login email, unique
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    pub role: Role,
    /// Contact number
    pub phone: Option<String>,
    /// Nationality
    pub nationality: Option<String>,
    /// Where the user lives now
    pub current_location: Option<String>,
    /// Highest completed level
    pub education_level: Option<String>,
    /// Subject area
    pub field_of_study: Option<String>,
    /// Comma-separated destination countries
    pub target_countries: Option<String>,
}

impl NewUser {
    /// Minimal user with the given role
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            phone: None,
            nationality: None,
            current_location: None,
            education_level: None,
            field_of_study: None,
            target_countries: None,
        }
    }

    /// With phone number
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Materialize the record; emails are stored lowercase
    #[must_use]
    pub fn into_user(self, id: UserId, created_at: DateTime<Utc>) -> User {
        User {
            id,
            email: self.email.trim().to_lowercase(),
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            phone: self.phone,
            nationality: self.nationality,
            current_location: self.current_location,
            education_level: self.education_level,
            field_of_study: self.field_of_study,
            target_countries: self.target_countries,
            created_at,
        }
    }
}

/// Counselor profile, keyed by the counselor's user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counselor {
    /// Id of the backing user
    pub user_id: UserId,
    /// Login email, unique
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Areas of expertise
    pub specializations: Vec<String>,
    /// Free-form counselor category
    pub counselor_type: Option<String>,
    /// Whether new requests may address this counselor
    pub is_available: bool,
    /// Advertised rate
    pub hourly_rate: Option<f64>,
    /// Mean session rating
    pub average_rating: f64,
    /// Number of rated sessions
    pub total_reviews: i32,
}

impl Counselor {
    /// Profile for an existing counselor user
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            specializations: Vec::new(),
            counselor_type: None,
            is_available: true,
            hourly_rate: None,
            average_rating: 0.0,
            total_reviews: 0,
        }
    }

    /// With specializations
    #[must_use]
    pub fn with_specializations<I, S>(mut self, specializations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specializations = specializations.into_iter().map(Into::into).collect();
        self
    }

    /// "First Last"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_roundtrips_through_str() {
        for role in [Role::Student, Role::Counselor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = NewUser::new("  Priya@Example.COM ", "Priya", "Shah", Role::Student)
            .into_user(UserId::new(), Utc::now());
        assert_eq!(user.email, "priya@example.com");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = NewUser::new("anon@example.com", "", " ", Role::Student)
            .into_user(UserId::new(), Utc::now());
        assert_eq!(user.display_name(), "anon@example.com");
    }
}

//! List filtering shared by dashboards and the CLI

use edubridge_store::{CounselorRequest, RequestStatus, UnknownVariant, User};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status selector for request lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every status
    #[default]
    All,
    /// One status
    Only(RequestStatus),
}

impl StatusFilter {
    /// Whether `status` passes
    #[inline]
    #[must_use]
    pub fn accepts(&self, status: RequestStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Requests passing `status` whose student id contains `query`
///
/// Matching is case-insensitive; an empty query matches everything.
#[must_use]
pub fn filter_requests(
    requests: &[CounselorRequest],
    status: StatusFilter,
    query: &str,
) -> Vec<CounselorRequest> {
    let needle = query.trim().to_lowercase();
    requests
        .iter()
        .filter(|r| status.accepts(r.status))
        .filter(|r| needle.is_empty() || r.student_id.to_string().contains(&needle))
        .cloned()
        .collect()
}

/// Users whose first name, last name or email contains `query`
#[must_use]
pub fn search_users(users: &[User], query: &str) -> Vec<User> {
    let needle = query.trim().to_lowercase();
    users
        .iter()
        .filter(|u| {
            needle.is_empty()
                || u.first_name.to_lowercase().contains(&needle)
                || u.last_name.to_lowercase().contains(&needle)
                || u.email.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use edubridge_store::{NewCounselorRequest, NewUser, RequestId, Role, UserId};

    #[test]
    fn status_filter_parses() {
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "approved".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(RequestStatus::Approved)
        );
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn filters_by_status_and_student() {
        let student = UserId::new();
        let mut approved = NewCounselorRequest::new(student, UserId::new())
            .into_request(RequestId::new(), Utc::now());
        approved.status = RequestStatus::Approved;
        let other = NewCounselorRequest::new(UserId::new(), UserId::new())
            .into_request(RequestId::new(), Utc::now());
        let requests = vec![approved.clone(), other];

        let hits = filter_requests(&requests, StatusFilter::Only(RequestStatus::Approved), "");
        assert_eq!(hits, vec![approved.clone()]);

        let prefix = student.to_string()[..8].to_uppercase();
        let hits = filter_requests(&requests, StatusFilter::All, &prefix);
        assert_eq!(hits, vec![approved]);
    }

    #[test]
    fn user_search_matches_names_and_email() {
        let users: Vec<User> = [
            ("nora@example.com", "Nora", "Quinn"),
            ("omar@uni.edu", "Omar", "Haddad"),
        ]
        .into_iter()
        .map(|(email, first, last)| {
            NewUser::new(email, first, last, Role::Student).into_user(UserId::new(), Utc::now())
        })
        .collect();

        assert_eq!(search_users(&users, "quinn").len(), 1);
        assert_eq!(search_users(&users, "UNI.EDU")[0].first_name, "Omar");
        assert_eq!(search_users(&users, "  ").len(), 2);
    }
}

//! Counselor directory and user administration

use crate::actor::Actor;
use crate::error::{CoreError, CoreResult, ValidationError};
use edubridge_store::{Counselor, NewUser, RecordStore, Role, User, UserId};
use std::sync::Arc;

/// Counselor listings, availability and user administration
#[derive(Debug)]
pub struct DirectoryService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for DirectoryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + ?Sized> DirectoryService<S> {
    /// Create service over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    // ---- counselors ----

    /// Counselors accepting students, ordered by id
    pub async fn available_counselors(&self) -> CoreResult<Vec<Counselor>> {
        let mut counselors: Vec<_> = self
            .store
            .all_counselors()
            .await?
            .into_iter()
            .filter(|c| c.is_available)
            .collect();
        counselors.sort_by_key(|c| c.user_id);
        Ok(counselors)
    }

    /// Every counselor profile ordered by name
    pub async fn all_counselors(&self) -> CoreResult<Vec<Counselor>> {
        Ok(self.store.all_counselors().await?)
    }

    /// Counselor by user id
    pub async fn counselor(&self, counselor_id: UserId) -> CoreResult<Counselor> {
        Ok(self.store.get_counselor(counselor_id).await?)
    }

    /// Counselor by email
    pub async fn counselor_by_email(&self, email: &str) -> CoreResult<Counselor> {
        Ok(self.store.get_counselor_by_email(email).await?)
    }

    /// Counselors whose name, email or a specialization contains `query`
    pub async fn search_counselors(&self, query: &str) -> CoreResult<Vec<Counselor>> {
        let needle = query.trim().to_lowercase();
        let counselors = self.store.all_counselors().await?;
        if needle.is_empty() {
            return Ok(counselors);
        }
        Ok(counselors
            .into_iter()
            .filter(|c| {
                c.display_name().to_lowercase().contains(&needle)
                    || c.email.to_lowercase().contains(&needle)
                    || c
                        .specializations
                        .iter()
                        .any(|s| s.to_lowercase().contains(&needle))
            })
            .collect())
    }

    /// Toggle availability; allowed for the counselor and for admins
    pub async fn set_availability(
        &self,
        actor: &Actor,
        counselor_id: UserId,
        is_available: bool,
    ) -> CoreResult<Counselor> {
        let actor = actor.refresh(&*self.store).await?;
        if actor.user_id != counselor_id && !actor.is_admin() {
            return Err(CoreError::forbidden(
                actor.user_id,
                actor.role,
                "change another counselor's availability",
            ));
        }
        let counselor = self
            .store
            .set_counselor_availability(counselor_id, is_available)
            .await?;
        tracing::info!(counselor_id = %counselor_id, is_available, "availability changed");
        Ok(counselor)
    }

    /// Register a counselor user with a profile; admin only
    pub async fn register_counselor<I, T>(
        &self,
        admin: &Actor,
        user: NewUser,
        specializations: I,
    ) -> CoreResult<Counselor>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        admin
            .authorize(&*self.store, Role::Admin, "register counselors")
            .await?;
        let user = self
            .store
            .insert_user(NewUser {
                role: Role::Counselor,
                ..check_new_user(user)?
            })
            .await?;
        let counselor = self
            .store
            .upsert_counselor(Counselor::for_user(&user).with_specializations(specializations))
            .await?;
        tracing::info!(counselor_id = %user.id, "counselor registered");
        Ok(counselor)
    }

    // ---- users ----

    /// Create a student account
    pub async fn create_student_user(&self, user: NewUser) -> CoreResult<User> {
        let user = self
            .store
            .insert_user(NewUser {
                role: Role::Student,
                ..check_new_user(user)?
            })
            .await?;
        tracing::info!(user_id = %user.id, "student account created");
        Ok(user)
    }

    /// Every user, newest first; admin only
    pub async fn all_users(&self, admin: &Actor) -> CoreResult<Vec<User>> {
        admin
            .authorize(&*self.store, Role::Admin, "list users")
            .await?;
        Ok(self.store.all_users().await?)
    }

    /// User by email
    pub async fn user_by_email(&self, email: &str) -> CoreResult<User> {
        Ok(self.store.get_user_by_email(email).await?)
    }

    /// Remove every connection request of a student; admin only
    ///
    /// The user record itself is kept.
    pub async fn cleanup_student_data(&self, admin: &Actor, student_id: UserId) -> CoreResult<u64> {
        let admin = admin
            .authorize(&*self.store, Role::Admin, "clean up student data")
            .await?;
        let student = self.store.get_user(student_id).await?;
        if student.role != Role::Student {
            return Err(ValidationError::invalid(
                "student_id",
                format!("{} is a {}", student.email, student.role),
            )
            .into());
        }
        let removed = self.store.delete_requests_for_student(student_id).await?;
        tracing::info!(
            student_id = %student_id,
            admin_id = %admin.user_id,
            removed,
            "student requests removed"
        );
        Ok(removed)
    }
}

fn check_new_user(user: NewUser) -> Result<NewUser, ValidationError> {
    let email = user.email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if !email.contains('@') {
        return Err(ValidationError::invalid("email", format!("'{email}' is not an address")));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edubridge_store::MemoryStore;

    async fn setup() -> (DirectoryService<MemoryStore>, Actor) {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(NewUser::new("root@example.com", "Ada", "Admin", Role::Admin))
            .await
            .unwrap();
        (DirectoryService::new(store), Actor::from_user(&admin))
    }

    #[tokio::test]
    async fn student_accounts_are_forced_to_student_role() {
        let (directory, _) = setup().await;
        let user = directory
            .create_student_user(NewUser::new("sam@example.com", "Sam", "Lee", Role::Admin))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (directory, _) = setup().await;
        let err = directory
            .create_student_user(NewUser::new("not-an-email", "Sam", "Lee", Role::Student))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn search_covers_specializations() {
        let (directory, admin) = setup().await;
        directory
            .register_counselor(
                &admin,
                NewUser::new("mia@example.com", "Mia", "Chen", Role::Counselor),
                ["UK admissions", "Scholarships"],
            )
            .await
            .unwrap();

        assert_eq!(directory.search_counselors("scholar").await.unwrap().len(), 1);
        assert_eq!(directory.search_counselors("CHEN").await.unwrap().len(), 1);
        assert!(directory.search_counselors("medicine").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn availability_toggle_hides_counselor() {
        let (directory, admin) = setup().await;
        let counselor = directory
            .register_counselor(
                &admin,
                NewUser::new("mia@example.com", "Mia", "Chen", Role::Counselor),
                Vec::<String>::new(),
            )
            .await
            .unwrap();
        assert_eq!(directory.available_counselors().await.unwrap().len(), 1);

        let user = directory.user_by_email("mia@example.com").await.unwrap();
        directory
            .set_availability(&Actor::from_user(&user), counselor.user_id, false)
            .await
            .unwrap();
        assert!(directory.available_counselors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn students_cannot_list_users_or_toggle_others() {
        let (directory, admin) = setup().await;
        let counselor = directory
            .register_counselor(
                &admin,
                NewUser::new("mia@example.com", "Mia", "Chen", Role::Counselor),
                Vec::<String>::new(),
            )
            .await
            .unwrap();
        let student = directory
            .create_student_user(NewUser::new("sam@example.com", "Sam", "Lee", Role::Student))
            .await
            .unwrap();
        let student = Actor::from_user(&student);

        assert!(matches!(
            directory.all_users(&student).await,
            Err(CoreError::Forbidden { .. })
        ));
        assert!(matches!(
            directory
                .set_availability(&student, counselor.user_id, false)
                .await,
            Err(CoreError::Forbidden { .. })
        ));
        assert_eq!(directory.all_users(&admin).await.unwrap().len(), 3);
    }
}

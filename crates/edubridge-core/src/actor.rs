//! Acting user snapshot
//!
//! An [`Actor`] is a view of the calling user. It is never trusted as an
//! authority: every privileged action re-reads the user from the store and
//! checks the fresh role.

use crate::error::{CoreError, CoreResult};
use edubridge_store::{RecordStore, Role, User, UserId};
use serde::{Deserialize, Serialize};

/// Snapshot of the user performing an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Id of the acting user
    pub user_id: UserId,
    /// Role at snapshot time; refreshed before privileged actions
    pub role: Role,
    /// Login email
    pub email: String,
    /// First and last name
    pub display_name: String,
}

impl Actor {
    /// Snapshot of a loaded user
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            email: user.email.clone(),
            display_name: user.display_name(),
        }
    }

    /// Load a snapshot from the store
    pub async fn load<S>(store: &S, user_id: UserId) -> CoreResult<Self>
    where
        S: RecordStore + ?Sized,
    {
        Ok(Self::from_user(&store.get_user(user_id).await?))
    }

    /// Load a snapshot by email
    pub async fn load_by_email<S>(store: &S, email: &str) -> CoreResult<Self>
    where
        S: RecordStore + ?Sized,
    {
        Ok(Self::from_user(&store.get_user_by_email(email).await?))
    }

    /// Re-read this user from the store
    pub async fn refresh<S>(&self, store: &S) -> CoreResult<Self>
    where
        S: RecordStore + ?Sized,
    {
        let fresh = Self::load(store, self.user_id).await?;
        if fresh.role != self.role {
            tracing::warn!(
                user_id = %self.user_id,
                snapshot_role = %self.role,
                stored_role = %fresh.role,
                "actor snapshot was stale"
            );
        }
        Ok(fresh)
    }

    /// Refresh and require `role`
    pub async fn authorize<S>(&self, store: &S, role: Role, action: &'static str) -> CoreResult<Self>
    where
        S: RecordStore + ?Sized,
    {
        let fresh = self.refresh(store).await?;
        fresh.require(role, action)?;
        Ok(fresh)
    }

    /// Fail unless the snapshot has `role`
    pub fn require(&self, role: Role, action: &'static str) -> CoreResult<()> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = %self.role, action, "action refused");
            Err(CoreError::forbidden(self.user_id, self.role, action))
        }
    }

    /// Check for the admin role
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

//! User repository for database operations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use ledgerloop_core::access::{ContactDetails, UserDirectory, UserProfile};
use ledgerloop_core::workflow::WorkflowError;
use ledgerloop_shared::types::UserId;

use crate::entities::users;

use super::{db_error, unique_or_db};

/// User repository; users are keyed by mobile number.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Converts a stored user into its directory profile.
    #[must_use]
    pub fn profile(user: &users::Model) -> UserProfile {
        UserProfile {
            id: UserId::from_uuid(user.id),
            mobile: user.mobile.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            enabled: user.enabled,
        }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, WorkflowError> {
        users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Finds a user by normalized mobile number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_mobile(&self, mobile: &str) -> Result<Option<users::Model>, WorkflowError> {
        users::Entity::find()
            .filter(users::Column::Mobile.eq(mobile))
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    async fn insert(&self, contact: &ContactDetails) -> Result<users::Model, WorkflowError> {
        let now = Utc::now().into();
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            mobile: Set(contact.mobile.clone()),
            name: Set(contact.name.clone()),
            email: Set(contact.email.clone()),
            enabled: Set(contact.enabled),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_or_db(e, || format!("User {} already exists", contact.mobile)))
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_or_create_by_contact(
        &self,
        contact: &ContactDetails,
    ) -> Result<UserProfile, WorkflowError> {
        let contact = contact.normalized()?;
        if let Some(user) = self.find_by_mobile(&contact.mobile).await? {
            return Ok(Self::profile(&user));
        }

        match self.insert(&contact).await {
            Ok(user) => {
                info!(user_id = %user.id, "User created");
                Ok(Self::profile(&user))
            }
            // Lost a race with another insert for the same mobile.
            Err(WorkflowError::Conflict(msg)) => self
                .find_by_mobile(&contact.mobile)
                .await?
                .map(|user| Self::profile(&user))
                .ok_or(WorkflowError::Conflict(msg)),
            Err(err) => Err(err),
        }
    }
}

//! User operations on the users collection

use chrono::Utc;
use uuid::Uuid;

use super::{AnalysesDocument, DataStore, NewUser, StoreError, User, UserMetadata, UserProfile};
use super::{UserSettings, UserUpdate, UsersDocument};

/// Emails are compared and stored trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_user_id() -> String {
    format!("user_{}", Uuid::new_v4().simple())
}

impl DataStore {
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let users: UsersDocument = self.load()?;
        Ok(users.users.into_iter().find(|u| u.email == email))
    }

    pub fn find_user_by_id(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let users: UsersDocument = self.load()?;
        Ok(users.users.into_iter().find(|u| u.id == user_id))
    }

    /// Append a new account
    ///
    /// Email uniqueness is checked against the document just loaded; two
    /// processes writing at once can still race.
    pub fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users: UsersDocument = self.load()?;
        let email = normalize_email(&new_user.email);

        if users.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }
        if users.users.len() >= users.config.max_users {
            return Err(StoreError::CapacityReached(users.config.max_users));
        }

        let now = Utc::now();
        let user = User {
            id: generate_user_id(),
            name: new_user.name.trim().to_string(),
            email,
            date_of_birth: new_user.date_of_birth,
            password: new_user.password_hash,
            join_date: now,
            medical_id: new_user.medical_id.filter(|m| !m.trim().is_empty()),
            profile: UserProfile::default(),
            analyses: Vec::new(),
            settings: UserSettings::default(),
            metadata: UserMetadata {
                created_at: now,
                last_login: None,
                login_count: 0,
                last_updated: None,
            },
        };

        users.users.push(user.clone());
        self.save(&mut users)?;

        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    /// Apply a partial update and stamp `metadata.lastUpdated`
    pub fn update_user(&self, user_id: &str, update: UserUpdate) -> Result<User, StoreError> {
        self.modify_user(user_id, |user| {
            if let Some(name) = update.name {
                user.name = name.trim().to_string();
            }
            if let Some(medical_id) = update.medical_id {
                user.medical_id = medical_id.filter(|m| !m.trim().is_empty());
            }
            if let Some(settings) = update.settings {
                user.settings = settings;
            }
            if let Some(hash) = update.password_hash {
                user.password = hash;
            }
        })
    }

    /// Bump login bookkeeping after a successful credential check
    pub fn record_login(&self, user_id: &str) -> Result<User, StoreError> {
        self.modify_user(user_id, |user| {
            user.metadata.last_login = Some(Utc::now());
            user.metadata.login_count += 1;
        })
    }

    /// Remove an account and every analysis it owns
    pub fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        let mut users: UsersDocument = self.load()?;
        let before = users.users.len();
        users.users.retain(|u| u.id != user_id);
        if users.users.len() == before {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }
        self.save(&mut users)?;

        let mut analyses: AnalysesDocument = self.load()?;
        let removed = analyses.remove_for_user(user_id);
        if removed > 0 {
            self.save(&mut analyses)?;
        }

        tracing::info!("Deleted user {} and {} analyses", user_id, removed);
        Ok(())
    }

    fn modify_user(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut User),
    ) -> Result<User, StoreError> {
        let mut users: UsersDocument = self.load()?;
        let user = users
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        apply(user);
        user.metadata.last_updated = Some(Utc::now());
        let updated = user.clone();

        self.save(&mut users)?;
        Ok(updated)
    }
}

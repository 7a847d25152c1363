//! Account signup, login and password changes against the local store
//!
//! Session issuing is left to the caller (see `session::SessionStore`),
//! these functions only check credentials and touch the users collection.

pub mod password;
pub mod validation;

use chrono::NaiveDate;
use thiserror::Error;

use crate::store::{DataStore, NewUser, StoreError, User, UserUpdate};
pub use password::PasswordHasher;
pub use validation::{PasswordStrength, SignupForm, ValidationError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No account found for {0}")]
    UnknownEmail(String),

    #[error("incorrect password")]
    IncorrectPassword,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate the form, hash the password and create the account
pub fn signup(
    store: &DataStore,
    hasher: &PasswordHasher,
    form: &SignupForm,
    today: NaiveDate,
) -> Result<User, AuthError> {
    let valid = form.validate(today)?;
    let user = store.create_user(NewUser {
        name: valid.name,
        email: valid.email,
        date_of_birth: valid.date_of_birth,
        password_hash: hasher.hash(&valid.password),
        medical_id: valid.medical_id,
    })?;
    tracing::info!("Signed up {}", user.email);
    Ok(user)
}

/// Check credentials and record the login
pub fn login(store: &DataStore, email: &str, password: &str) -> Result<User, AuthError> {
    validation::validate_login(email, password)?;

    let user = store
        .find_user_by_email(email)?
        .ok_or_else(|| AuthError::UnknownEmail(email.trim().to_string()))?;

    if !password::verify(password, &user.password) {
        tracing::warn!("Failed login for {}", user.id);
        return Err(AuthError::IncorrectPassword);
    }

    let user = store.record_login(&user.id)?;
    tracing::info!("Logged in {} (login #{})", user.id, user.metadata.login_count);
    Ok(user)
}

/// Replace a user's password after re-checking the current one
pub fn change_password(
    store: &DataStore,
    hasher: &PasswordHasher,
    user_id: &str,
    current: &str,
    new_password: &str,
    confirm: &str,
) -> Result<User, AuthError> {
    let user = store
        .find_user_by_id(user_id)?
        .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

    if !password::verify(current, &user.password) {
        return Err(AuthError::IncorrectPassword);
    }
    validation::check_password_rules(new_password)?;
    if new_password != confirm {
        return Err(ValidationError::PasswordMismatch.into());
    }

    let user = store.update_user(
        user_id,
        UserUpdate {
            password_hash: Some(hasher.hash(new_password)),
            ..Default::default()
        },
    )?;
    tracing::info!("Password changed for {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;
    use chrono::{Months, Utc};

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(1_000)
    }

    fn jean_form() -> SignupForm {
        let today = Utc::now().date_naive();
        let dob = today.checked_sub_months(Months::new(25 * 12)).unwrap();
        SignupForm {
            name: "Jean Dupont".to_string(),
            email: "jean@x.com".to_string(),
            date_of_birth: dob.format("%Y-%m-%d").to_string(),
            password: "Abcdef12".to_string(),
            confirm_password: "Abcdef12".to_string(),
            accepted_terms: true,
            medical_id: None,
        }
    }

    #[test]
    fn test_signup_then_login() {
        let (_dir, store) = temp_store();
        let today = Utc::now().date_naive();

        let created = signup(&store, &hasher(), &jean_form(), today).unwrap();
        assert!(created.password.starts_with("pbkdf2-sha256$"));
        assert_ne!(created.password, "Abcdef12");

        let user = login(&store, "jean@x.com", "Abcdef12").unwrap();
        assert_eq!(user.id, created.id);
        assert_eq!(user.metadata.login_count, 1);

        let err = login(&store, "jean@x.com", "Abcdef13").unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));
        assert_eq!(err.to_string(), "incorrect password");
    }

    #[test]
    fn test_login_unknown_email() {
        let (_dir, store) = temp_store();
        let err = login(&store, "nobody@x.com", "Abcdef12").unwrap_err();
        assert!(matches!(err, AuthError::UnknownEmail(ref e) if e == "nobody@x.com"));
    }

    #[test]
    fn test_login_validates_form_first() {
        let (_dir, store) = temp_store();
        let err = login(&store, "not-an-email", "Abcdef12").unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::InvalidEmail)
        ));
    }

    #[test]
    fn test_duplicate_signup() {
        let (_dir, store) = temp_store();
        let today = Utc::now().date_naive();
        signup(&store, &hasher(), &jean_form(), today).unwrap();

        let mut again = jean_form();
        again.email = "JEAN@x.com".to_string();
        let err = signup(&store, &hasher(), &again, today).unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::DuplicateEmail(_))));
    }

    #[test]
    fn test_invalid_signup_creates_nothing() {
        let (_dir, store) = temp_store();
        let mut form = jean_form();
        form.accepted_terms = false;
        let err = signup(&store, &hasher(), &form, Utc::now().date_naive()).unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::TermsNotAccepted)
        ));
        assert!(store.find_user_by_email("jean@x.com").unwrap().is_none());
    }

    #[test]
    fn test_change_password() {
        let (_dir, store) = temp_store();
        let user = signup(&store, &hasher(), &jean_form(), Utc::now().date_naive()).unwrap();

        let err = change_password(&store, &hasher(), &user.id, "wrong", "Newpass99", "Newpass99")
            .unwrap_err();
        assert!(matches!(err, AuthError::IncorrectPassword));

        let err = change_password(&store, &hasher(), &user.id, "Abcdef12", "short", "short")
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::PasswordTooShort)
        ));

        let err =
            change_password(&store, &hasher(), &user.id, "Abcdef12", "Newpass99", "Newpass98")
                .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Validation(ValidationError::PasswordMismatch)
        ));

        change_password(&store, &hasher(), &user.id, "Abcdef12", "Newpass99", "Newpass99")
            .unwrap();
        assert!(login(&store, "jean@x.com", "Newpass99").is_ok());
        assert!(matches!(
            login(&store, "jean@x.com", "Abcdef12"),
            Err(AuthError::IncorrectPassword)
        ));
    }
}

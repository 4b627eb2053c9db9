use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::http::StatusCode;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use gramalisis_db::Database;
use gramalisis_db::models::{NewUser, ProfileColumns};
use gramalisis_types::api::{ChangePasswordRequest, RegisterRequest};
use gramalisis_types::UserProfile;

use crate::convert::profile_from_row;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("password must be at least 6 characters")]
    WeakPassword,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("user not found")]
    UserNotFound,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_)
            | Self::InvalidEmail
            | Self::WeakPassword
            | Self::PasswordMismatch => StatusCode::BAD_REQUEST,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::NotSignedIn => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Hashing(_) | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AccountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.'),
        None => false,
    }
}

fn normalize_email(email: &str) -> Result<String, AccountError> {
    let email = required(email, "email")?.to_lowercase();
    if !is_valid_email(&email) {
        return Err(AccountError::InvalidEmail);
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::WeakPassword);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

/// Create an account and its profile. Blocking; call off the async runtime.
pub fn register_account(db: &Database, req: &RegisterRequest) -> Result<UserProfile, AccountError> {
    let first_name = required(&req.first_name, "first_name")?;
    let last_name = required(&req.last_name, "last_name")?;
    let job = required(&req.job, "job")?;
    let email = normalize_email(&req.email)?;
    let password = required(&req.password, "password")?;
    check_password(&password)?;

    if db.get_user_by_email(&email)?.is_some() {
        return Err(AccountError::EmailTaken);
    }

    let password_hash = hash_password(&password)?;
    let uid = Uuid::new_v4();
    let id = uid.to_string();

    db.create_user(&NewUser {
        id: &id,
        email: &email,
        password_hash: &password_hash,
        first_name: &first_name,
        last_name: &last_name,
        job: &job,
    })?;
    info!(%uid, "account registered");

    Ok(UserProfile {
        uid,
        first_name,
        last_name,
        username: email,
        job,
        photo_url: String::new(),
        level: 1,
    })
}

/// Check an email/password pair and return the matching profile.
pub fn verify_credentials(
    db: &Database,
    email: &str,
    password: &str,
) -> Result<UserProfile, AccountError> {
    let email = email.trim().to_lowercase();
    let user = db
        .get_user_by_email(&email)?
        .ok_or(AccountError::InvalidCredentials)?;

    let parsed_hash =
        PasswordHash::new(&user.password).map_err(|e| AccountError::Hashing(e.to_string()))?;

    Argon2::default()
        .verify_password(password.trim().as_bytes(), &parsed_hash)
        .map_err(|_| AccountError::InvalidCredentials)?;

    Ok(profile_from_row(&user))
}

pub fn change_password(
    db: &Database,
    uid: Uuid,
    req: &ChangePasswordRequest,
) -> Result<(), AccountError> {
    let password = req.password.trim();
    check_password(password)?;
    if password != req.confirm_password.trim() {
        return Err(AccountError::PasswordMismatch);
    }

    let password_hash = hash_password(password)?;
    if !db.update_password(&uid.to_string(), &password_hash)? {
        return Err(AccountError::UserNotFound);
    }
    info!(%uid, "password changed");
    Ok(())
}

/// Persist the editable fields of `profile` and raise its stored level.
///
/// The email doubles as the sign-in name, so it is validated and must stay
/// unique. Returns the profile as stored.
pub fn save_profile(db: &Database, profile: &UserProfile) -> Result<UserProfile, AccountError> {
    let id = profile.uid.to_string();
    let email = normalize_email(&profile.username)?;

    if let Some(owner) = db.get_user_by_email(&email)? {
        if owner.id != id {
            return Err(AccountError::EmailTaken);
        }
    }

    let updated = db.update_profile(
        &id,
        &ProfileColumns {
            first_name: profile.first_name.trim(),
            last_name: profile.last_name.trim(),
            email: &email,
            job: profile.job.trim(),
            photo_url: profile.photo_url.trim(),
        },
    )?;
    if !updated {
        return Err(AccountError::UserNotFound);
    }
    db.raise_level(&id, profile.level)?;

    let row = db.get_user_by_id(&id)?.ok_or(AccountError::UserNotFound)?;
    Ok(profile_from_row(&row))
}

pub fn load_profile(db: &Database, uid: Uuid) -> Result<Option<UserProfile>, AccountError> {
    Ok(db.get_user_by_id(&uid.to_string())?.as_ref().map(profile_from_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: " Ana ".into(),
            last_name: "Ruiz".into(),
            job: "Docente".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b@mail.example.org"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("ana@.com"));
    }

    #[test]
    fn test_register_and_sign_in() {
        let db = Database::open_in_memory().unwrap();
        let profile = register_account(&db, &request(" Ana@Example.com ", "secreto")).unwrap();

        assert_eq!(profile.username, "ana@example.com");
        assert_eq!(profile.first_name, "Ana");
        assert_eq!(profile.level, 1);
        assert_eq!(profile.photo_url, "");

        let signed_in = verify_credentials(&db, "ANA@example.com", "secreto").unwrap();
        assert_eq!(signed_in, profile);
        assert!(matches!(
            verify_credentials(&db, "ana@example.com", "otro-secreto"),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_credentials(&db, "nadie@example.com", "secreto"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_validation() {
        let db = Database::open_in_memory().unwrap();
        let mut missing = request("ana@example.com", "secreto");
        missing.job = "   ".into();

        assert!(matches!(register_account(&db, &missing), Err(AccountError::MissingField("job"))));
        assert!(matches!(
            register_account(&db, &request("ana-at-example", "secreto")),
            Err(AccountError::InvalidEmail)
        ));
        assert!(matches!(
            register_account(&db, &request("ana@example.com", "corto")),
            Err(AccountError::WeakPassword)
        ));

        register_account(&db, &request("ana@example.com", "secreto")).unwrap();
        let dup = register_account(&db, &request("ANA@example.com", "secreto")).unwrap_err();
        assert!(matches!(dup, AccountError::EmailTaken));
        assert_eq!(dup.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_change_password() {
        let db = Database::open_in_memory().unwrap();
        let profile = register_account(&db, &request("ana@example.com", "secreto")).unwrap();

        let mismatch = ChangePasswordRequest {
            password: "nuevo-secreto".into(),
            confirm_password: "otro".into(),
        };
        assert!(matches!(
            change_password(&db, profile.uid, &mismatch),
            Err(AccountError::PasswordMismatch)
        ));

        let ok = ChangePasswordRequest {
            password: "nuevo-secreto".into(),
            confirm_password: "nuevo-secreto".into(),
        };
        change_password(&db, profile.uid, &ok).unwrap();
        assert!(verify_credentials(&db, "ana@example.com", "nuevo-secreto").is_ok());
        assert!(matches!(
            change_password(&db, Uuid::new_v4(), &ok),
            Err(AccountError::UserNotFound)
        ));
    }

    #[test]
    fn test_save_profile_keeps_level_floor() {
        let db = Database::open_in_memory().unwrap();
        let mut profile = register_account(&db, &request("ana@example.com", "secreto")).unwrap();
        register_account(&db, &request("luis@example.com", "secreto")).unwrap();

        profile.level = 3;
        profile.job = "Editora".into();
        let stored = save_profile(&db, &profile).unwrap();
        assert_eq!(stored.level, 3);
        assert_eq!(stored.job, "Editora");

        profile.level = 1;
        assert_eq!(save_profile(&db, &profile).unwrap().level, 3);

        profile.username = "luis@example.com".into();
        assert!(matches!(save_profile(&db, &profile), Err(AccountError::EmailTaken)));
    }
}

//! User service
//!
//! Registration, login, profile updates and accounts created through a login
//! provider. The first account ever registered becomes the administrator.

use sqlx::SqliteConnection;

use super::password::{hash_password, unusable_password_hash, verify_password};
use super::validation::{
    email_like, length_in_range, string_is_present, strings_match, validate, FieldError,
    FieldErrors,
};
use crate::db::repositories::user::{self as user_repo, NewUser};
use crate::models::{ListParams, LoginInput, PagedResult, RegisterInput, UpdateUserInput, User};

const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 20;
const WEAK_PASSWORD: &str = "Password is too weak.";
const PASSWORD_MISMATCH: &str = "Passwords do not match";
const INVALID_LOGIN: &str = "Invalid email or password.";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// The acting user may not touch this account
    #[error("Not allowed to modify user {0}")]
    Forbidden(i64),

    /// A provider login carried an email that belongs to another account
    #[error("Email {0} is already registered")]
    EmailTaken(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Identity returned by a login provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: String,
    pub provider_id: String,
    pub name: String,
    pub nickname: String,
    pub email: String,
}

async fn username_available(
    conn: &mut SqliteConnection,
    username: &str,
    except: Option<i64>,
) -> Result<Option<FieldError>, UserServiceError> {
    let taken = user_repo::get_by_username(conn, username)
        .await?
        .is_some_and(|u| Some(u.id) != except);
    Ok(taken.then(|| {
        FieldError::new("username", format!("The username {} is not available", username))
    }))
}

async fn email_available(
    conn: &mut SqliteConnection,
    email: &str,
    except: Option<i64>,
) -> Result<Option<FieldError>, UserServiceError> {
    let taken = user_repo::get_by_email(conn, email)
        .await?
        .is_some_and(|u| Some(u.id) != except);
    Ok(taken.then(|| FieldError::new("email", format!("The email {} is not available", email))))
}

/// Register a local account
pub async fn register(
    conn: &mut SqliteConnection,
    input: &RegisterInput,
) -> Result<User, UserServiceError> {
    let name = input.name.trim();
    let username = input.username.trim();
    let email = input.email.trim();

    let mut errors = validate([
        string_is_present("name", "Name", name),
        string_is_present("username", "Username", username),
        string_is_present("email", "Email", email),
        string_is_present("password", "Password", &input.password),
        strings_match(
            "password_confirmation",
            &input.password,
            &input.password_confirmation,
            PASSWORD_MISMATCH,
        ),
    ]);
    if !email.is_empty() {
        errors.push_opt(email_like("email", email));
    }
    if !input.password.is_empty() {
        errors.push_opt(length_in_range(
            "password",
            &input.password,
            PASSWORD_MIN,
            PASSWORD_MAX,
            WEAK_PASSWORD,
        ));
    }
    if !username.is_empty() {
        errors.push_opt(username_available(conn, username, None).await?);
    }
    if !email.is_empty() {
        errors.push_opt(email_available(conn, email, None).await?);
    }
    errors.into_result().map_err(UserServiceError::ValidationError)?;

    let password_hash = hash_password(&input.password)?;
    let first_account = user_repo::count(conn).await? == 0;

    let user = user_repo::create(
        conn,
        &NewUser {
            name,
            username,
            email,
            password_hash: &password_hash,
            admin: first_account,
            provider: "",
            provider_id: "",
        },
    )
    .await?;

    tracing::info!(user_id = user.id, admin = user.admin, "Registered user");
    Ok(user)
}

/// Check an email + password pair
pub async fn authenticate(
    conn: &mut SqliteConnection,
    input: &LoginInput,
) -> Result<User, UserServiceError> {
    let invalid = || UserServiceError::ValidationError(FieldErrors::single("login", INVALID_LOGIN));

    let user = user_repo::get_by_email(conn, input.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&input.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    Ok(user)
}

pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<User, UserServiceError> {
    user_repo::get_by_id(conn, id)
        .await?
        .ok_or(UserServiceError::NotFound(id))
}

pub async fn list(
    conn: &mut SqliteConnection,
    params: &ListParams,
) -> Result<PagedResult<User>, UserServiceError> {
    Ok(user_repo::list(conn, params).await?)
}

/// Update an account on behalf of `editor`.
///
/// A blank password or email leaves the stored value untouched. Only admins
/// may change the admin flag.
pub async fn update(
    conn: &mut SqliteConnection,
    editor: &User,
    id: i64,
    input: &UpdateUserInput,
) -> Result<User, UserServiceError> {
    if !editor.can_edit(id) {
        return Err(UserServiceError::Forbidden(id));
    }
    let mut user = get(conn, id).await?;

    let name = input.name.trim();
    let username = input.username.trim();
    let email = input.email.trim();

    let mut errors = validate([
        string_is_present("name", "Name", name),
        string_is_present("username", "Username", username),
    ]);
    if !input.password.is_empty() {
        errors.merge(validate([
            length_in_range("password", &input.password, PASSWORD_MIN, PASSWORD_MAX, WEAK_PASSWORD),
            strings_match(
                "password_confirmation",
                &input.password,
                &input.password_confirmation,
                PASSWORD_MISMATCH,
            ),
        ]));
    }
    if !email.is_empty() {
        errors.push_opt(email_like("email", email));
        if user_repo::get_by_email(conn, email)
            .await?
            .is_some_and(|other| other.id != id)
        {
            errors.add("email", "Email is already being used.");
        }
    }
    if !username.is_empty() && username != user.username {
        errors.push_opt(username_available(conn, username, Some(id)).await?);
    }
    errors.into_result().map_err(UserServiceError::ValidationError)?;

    user.name = name.to_string();
    user.username = username.to_string();
    if !email.is_empty() {
        user.email = email.to_string();
    }
    if !input.password.is_empty() {
        user.password_hash = hash_password(&input.password)?;
    }
    if editor.admin {
        user.admin = input.admin_flag();
    }

    let updated = user_repo::update(conn, &user).await?;
    tracing::info!(user_id = id, editor_id = editor.id, "Updated user");
    Ok(updated)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<User, UserServiceError> {
    let user = get(conn, id).await?;
    user_repo::delete(conn, id).await?;
    tracing::info!(user_id = id, "Deleted user");
    Ok(user)
}

/// Find or create the account behind a provider identity.
///
/// Returns the user and whether it was created. A username collision is
/// resolved by appending a timestamp.
pub async fn provider_login(
    conn: &mut SqliteConnection,
    profile: &ProviderProfile,
) -> Result<(User, bool), UserServiceError> {
    if let Some(user) =
        user_repo::get_by_provider(conn, &profile.provider, &profile.provider_id).await?
    {
        return Ok((user, false));
    }

    if user_repo::get_by_email(conn, &profile.email).await?.is_some() {
        return Err(UserServiceError::EmailTaken(profile.email.clone()));
    }

    let mut username = if profile.nickname.trim().is_empty() {
        format!("{}{}", profile.provider, profile.provider_id)
    } else {
        profile.nickname.trim().to_string()
    };
    if user_repo::get_by_username(conn, &username).await?.is_some() {
        let suffix = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        username = format!("{}{}", username, suffix);
    }

    let name = if profile.name.trim().is_empty() {
        username.clone()
    } else {
        profile.name.trim().to_string()
    };
    let password_hash = unusable_password_hash()?;

    let user = user_repo::create(
        conn,
        &NewUser {
            name: &name,
            username: &username,
            email: &profile.email,
            password_hash: &password_hash,
            admin: false,
            provider: &profile.provider,
            provider_id: &profile.provider_id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, provider = %profile.provider, "Created user from provider login");
    Ok((user, true))
}

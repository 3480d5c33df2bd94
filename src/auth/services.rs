use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::Role,
    jwt::JwtKeys,
    password::{hash_password, verify_password, MIN_PASSWORD_LEN},
    repo::{EmailTaken, UserRepo},
    repo_types::{NewUser, User, UserChanges},
};
use crate::error::AppError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

async fn ensure_email_free(
    users: &dyn UserRepo,
    email: &str,
    except: Option<i64>,
) -> Result<(), AppError> {
    match users.find_by_email(email).await? {
        Some(existing) if Some(existing.id) != except => {
            warn!(email, "email already registered");
            Err(AppError::Conflict("email already registered".into()))
        }
        _ => Ok(()),
    }
}

/// A concurrent writer can claim the email between `ensure_email_free` and
/// the write; the store then reports [`EmailTaken`].
fn email_conflict(e: anyhow::Error) -> AppError {
    if e.is::<EmailTaken>() {
        AppError::Conflict("email already registered".into())
    } else {
        AppError::Internal(e)
    }
}

/// Builds the column changes for a profile update. An empty password means
/// "keep the current one"; anything else is hashed here, once.
async fn build_changes(
    users: &dyn UserRepo,
    id: i64,
    email: Option<String>,
    password: Option<String>,
    role: Option<Role>,
) -> Result<UserChanges, AppError> {
    let email = match email {
        Some(raw) => {
            let email = normalize_email(&raw)?;
            ensure_email_free(users, &email, Some(id)).await?;
            Some(email)
        }
        None => None,
    };

    let password_hash = match password.filter(|p| !p.is_empty()) {
        Some(plain) => {
            check_password(&plain)?;
            Some(hash_password(&plain)?)
        }
        None => None,
    };

    Ok(UserChanges {
        email,
        password_hash,
        role,
    })
}

/// New accounts always start with the `user` role.
pub async fn register(users: &dyn UserRepo, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email)?;
    check_password(password)?;
    ensure_email_free(users, &email, None).await?;

    let password_hash = hash_password(password)?;
    let user = users
        .create(NewUser {
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(email_conflict)?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<(String, User), AppError> {
    let email = email.trim().to_lowercase();

    let Some(user) = users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.issue(user.id, user.role)?;
    info!(user_id = user.id, role = %user.role, "user logged in");
    Ok((token, user))
}

pub async fn get_user(users: &dyn UserRepo, id: i64) -> Result<User, AppError> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

pub async fn update_profile(
    users: &dyn UserRepo,
    id: i64,
    email: Option<String>,
    password: Option<String>,
) -> Result<User, AppError> {
    let changes = build_changes(users, id, email, password, None).await?;
    let user = users
        .update(id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    info!(user_id = id, "profile updated");
    Ok(user)
}

/// A role change only reaches the user's requests once they log in again;
/// tokens already issued keep the role they were minted with.
pub async fn admin_update_user(
    users: &dyn UserRepo,
    id: i64,
    email: Option<String>,
    password: Option<String>,
    role: Option<Role>,
) -> Result<User, AppError> {
    let changes = build_changes(users, id, email, password, role).await?;
    let user = users
        .update(id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    info!(user_id = id, role = %user.role, "user updated by admin");
    Ok(user)
}

pub async fn delete_user(users: &dyn UserRepo, id: i64) -> Result<(), AppError> {
    if !users.delete(id).await? {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    info!(user_id = id, "user deleted");
    Ok(())
}

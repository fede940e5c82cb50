//! Account lifecycle operations shared by the user handlers.
//!
//! Password hashing and cascade deletion happen here, called explicitly by the handler
//! that needs them.

use actix_web::web;
use chrono::Utc;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{RegisterRequest, Session, UpdateUserRequest, User};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed";

/// Creates the account and opens its first session.
pub async fn register(state: &AppState, request: RegisterRequest) -> Result<(User, Session), AppError> {
    let request = request.normalized();
    request.validate()?;

    if state.store.find_user_by_email(&request.email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already registered".into()));
    }

    let password_hash = hash_blocking(request.password, state.bcrypt_cost).await?;
    let user = User::new(request.name, request.email, password_hash, request.age);
    let user = state.store.insert_user(&user).await?;
    let session = open_session(state, &user).await?;

    log::info!("Registered user {}", user.id);
    Ok((user, session))
}

/// Checks credentials and opens a new session.
///
/// Unknown emails and wrong passwords produce the same error.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, Session), AppError> {
    let email = normalize_email(email);
    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            log::warn!("Login attempt for unknown email");
            return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
        }
    };

    let password = password.trim().to_string();
    let digest = user.password_hash.clone();
    let valid = web::block(move || verify_password(&password, &digest)).await??;
    if !valid {
        log::warn!("Wrong password for user {}", user.id);
        return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
    }

    let session = open_session(state, &user).await?;
    log::info!("User {} logged in", user.id);
    Ok((user, session))
}

/// Issues a session for the user, first dropping any of theirs that have already expired.
pub async fn open_session(state: &AppState, user: &User) -> Result<Session, AppError> {
    let pruned = state
        .store
        .delete_expired_sessions(user.id, Utc::now())
        .await?;
    if pruned > 0 {
        log::debug!("Pruned {} expired sessions for user {}", pruned, user.id);
    }

    let session = state.tokens.issue(user.id)?;
    state.store.insert_session(&session).await?;
    Ok(session)
}

/// Applies a profile patch. The password is re-hashed only when the patch contains one.
pub async fn update_profile(
    state: &AppState,
    mut user: User,
    update: UpdateUserRequest,
) -> Result<User, AppError> {
    let update = update.normalized();
    update.validate()?;

    if let Some(email) = update.email {
        if email != user.email && state.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("Email is already registered".into()));
        }
        user.email = email;
    }
    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(age) = update.age {
        user.age = age;
    }
    if let Some(password) = update.password {
        user.password_hash = hash_blocking(password, state.bcrypt_cost).await?;
    }

    state.store.update_user(&user).await
}

/// Deletes the user together with their tasks, sessions and avatar.
///
/// The store removes all of it in one step, so a failure leaves the account untouched.
pub async fn delete_account(state: &AppState, user: &User) -> Result<(), AppError> {
    let removed = state
        .store
        .delete_user_cascade(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    log::info!(
        "Deleted user {} along with {} tasks and {} sessions",
        user.id,
        removed.tasks,
        removed.sessions
    );
    Ok(())
}

async fn hash_blocking(password: String, cost: u32) -> Result<String, AppError> {
    web::block(move || hash_password(&password, cost)).await?
}

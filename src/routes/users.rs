use crate::{
    accounts,
    auth::{AuthMiddleware, AuthResponse, AuthenticatedUser},
    error::AppError,
    models::{LoginRequest, RegisterRequest, UpdateUserRequest},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates the account and opens its first session.
///
/// ## Responses:
/// - `201 Created`: `{user, token}`.
/// - `400 Bad Request`: validation failure or email already registered.
#[post("")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let (user, session) = accounts::register(&state, register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        user,
        token: session.token,
    }))
}

/// Login user
///
/// Checks the credentials and opens a new session alongside any existing ones.
/// Unknown email and wrong password both answer `401 Login failed`.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (user, session) =
        accounts::login(&state, &login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        user,
        token: session.token,
    }))
}

/// Ends the session the request was authenticated with. Other sessions stay valid.
#[post("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.store.delete_session(&auth.token).await?;
    log::info!("User {} logged out", auth.user.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out" })))
}

/// Ends every session of the caller, including the current one.
#[post("/logoutAll", wrap = "AuthMiddleware")]
pub async fn logout_all(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let ended = state.store.delete_sessions_for_user(auth.user.id).await?;
    log::info!("User {} logged out of {} sessions", auth.user.id, ended);

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out of all sessions" })))
}

#[get("/me", wrap = "AuthMiddleware")]
pub async fn me(auth: AuthenticatedUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(auth.user))
}

/// Updates any subset of name, email, password and age.
///
/// ## Responses:
/// - `200 OK`: the updated user.
/// - `400 Bad Request`: a field outside that set, a validation failure or a taken email.
#[patch("/me", wrap = "AuthMiddleware")]
pub async fn update_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    update: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::update_profile(&state, auth.user, update.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Deletes the caller's account together with its tasks and sessions.
#[delete("/me", wrap = "AuthMiddleware")]
pub async fn delete_me(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    accounts::delete_account(&state, &auth.user).await?;
    Ok(HttpResponse::Ok().json(auth.user))
}

use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use chrono::Utc;
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Guards a resource: every request must carry `Authorization: Bearer <token>` naming a
/// live session. The resolved `AuthenticatedUser` is stored in request extensions.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            match resolve(&req).await {
                Ok(auth) => {
                    req.extensions_mut().insert(auth);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => {
                    log::warn!("Rejected request to {}: {}", req.path(), err);
                    let response = err.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

async fn resolve(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalServerError("Application state is not configured".into()))?;
    let token = bearer_token(req)?;
    authenticate(state, token).await
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AppError> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Please authenticate".into()))
}

/// Resolves a presented token to its user.
///
/// The signature and expiry are checked first, then the token must still have a session
/// record belonging to the token's subject. Expired session records are removed on sight.
pub async fn authenticate(state: &AppState, token: String) -> Result<AuthenticatedUser, AppError> {
    let claims = state.tokens.verify(&token)?;

    let session = state
        .store
        .find_session(&token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Session has ended".into()))?;

    if session.is_expired_at(Utc::now()) {
        state.store.delete_session(&token).await?;
        return Err(AppError::Unauthorized("Session has expired".into()));
    }
    if session.user_id != claims.sub {
        return Err(AppError::Unauthorized("Session does not match token".into()));
    }

    let user = state
        .store
        .find_user(session.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please authenticate".into()))?;

    Ok(AuthenticatedUser { user, token })
}

use crate::{
    auth::{AuthMiddleware, AuthenticatedUser},
    error::AppError,
    media,
    state::AppState,
};
use actix_multipart::{Field, Multipart};
use actix_web::{delete, get, http::header, post, web, HttpResponse, Responder};
use futures::TryStreamExt;
use serde_json::json;
use uuid::Uuid;

const AVATAR_FIELD: &str = "avatar";

/// Upload an avatar
///
/// Expects a multipart body whose `avatar` field carries a `.jpg`, `.jpeg` or `.png` file of
/// at most 1,000,000 bytes. The image is resized to 250×250 and stored as PNG.
/// Any rejection leaves the previously stored avatar in place.
#[post("/me/avatar", wrap = "AuthMiddleware")]
pub async fn upload_avatar(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
    mut payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut upload: Option<Vec<u8>> = None;

    while let Some(mut field) = payload.try_next().await? {
        let is_avatar = field.content_disposition().get_name() == Some(AVATAR_FIELD);
        if !is_avatar || upload.is_some() {
            drain(&mut field).await?;
            continue;
        }
        upload = Some(read_avatar_field(&mut field).await?);
    }

    let bytes = upload.ok_or_else(|| AppError::Media("Please upload an image".into()))?;
    let png = web::block(move || media::process_avatar(&bytes)).await??;
    state.store.set_avatar(auth.user.id, Some(png)).await?;
    log::info!("User {} uploaded an avatar", auth.user.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Avatar uploaded" })))
}

#[delete("/me/avatar", wrap = "AuthMiddleware")]
pub async fn delete_avatar(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.store.set_avatar(auth.user.id, None).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Avatar deleted" })))
}

/// Serves a user's avatar as `image/png`. Public.
#[get("/{id}/avatar")]
pub async fn get_avatar(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let avatar = state
        .store
        .find_avatar(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Avatar not found".into()))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, media::AVATAR_CONTENT_TYPE))
        .body(avatar))
}

/// Reads the file part, failing as soon as the size limit is crossed.
async fn read_avatar_field(field: &mut Field) -> Result<Vec<u8>, AppError> {
    let filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_string();
    media::check_filename(&filename)?;

    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        bytes.extend_from_slice(&chunk);
        media::check_size(bytes.len())?;
    }
    Ok(bytes)
}

async fn drain(field: &mut Field) -> Result<(), AppError> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

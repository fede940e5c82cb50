pub mod avatar;
pub mod health;
pub mod pages;
pub mod tasks;
pub mod users;

use actix_web::{error, web};

use crate::error::AppError;

/// Registers every route plus the extractor configs that turn malformed JSON, query strings
/// and path ids into `AppError` bodies.
///
/// Protected handlers carry `AuthMiddleware` themselves, so public and protected routes can
/// share a scope. Expects `web::Data<AppState>` to be registered on the `App`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::ValidationError(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::ValidationError(err.to_string()))
    }))
    .app_data(web::PathConfig::default().error_handler(|_err, _req| {
        error::Error::from(AppError::NotFound("Not found".into()))
    }))
    .service(health::health)
    .service(pages::index)
    .service(tasks::find_task_by_description)
    .service(
        web::scope("/users")
            .service(users::register)
            .service(pages::login_page)
            .service(users::login)
            .service(users::logout)
            .service(users::logout_all)
            .service(users::me)
            .service(users::update_me)
            .service(users::delete_me)
            .service(avatar::upload_avatar)
            .service(avatar::delete_avatar)
            .service(avatar::get_avatar),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

use crate::{
    auth::{AuthMiddleware, AuthenticatedUser},
    error::AppError,
    models::{DescriptionLookup, Task, TaskFilter, TaskInput, TaskQuery, TaskUpdate},
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `completed` (optional): only tasks in this completion state.
/// - `limit` (optional): page size; `0` means no limit.
/// - `skip` (optional): number of matching tasks to skip.
/// - `sortBy` (optional): `<field>:asc` or `<field>:desc`, where field is one of
///   `description`, `completed`, `createdAt`, `updatedAt`.
///
/// Without `sortBy`, tasks come back oldest first.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects.
/// - `400 Bad Request`: malformed query or unknown sort field/direction.
/// - `401 Unauthorized`: missing or invalid session.
#[get("", wrap = "AuthMiddleware")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    query_params: web::Query<TaskQuery>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let filter = TaskFilter::try_from(query_params.into_inner())?;
    let tasks = state.store.list_tasks(auth.user.id, &filter).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task for the authenticated user.
///
/// ## Request Body:
/// - `description`: required, non-empty after trimming.
/// - `completed` (optional): defaults to `false`.
///
/// Any `owner` in the body is ignored; the task always belongs to the caller.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: validation failure.
/// - `401 Unauthorized`: missing or invalid session.
#[post("", wrap = "AuthMiddleware")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskInput>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let input = task_data.into_inner().normalized();
    input.validate()?;

    let task = Task::new(input, auth.user.id);
    let result = state.store.insert_task(&task).await?;

    Ok(HttpResponse::Created().json(result))
}

/// Finds the caller's first task whose description matches exactly.
///
/// The description travels in a JSON body: `{"description": "..."}`.
#[get("/task", wrap = "AuthMiddleware")]
pub async fn find_task_by_description(
    state: web::Data<AppState>,
    lookup: web::Json<DescriptionLookup>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .store
        .find_task_by_description(auth.user.id, &lookup.description)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `401 Unauthorized`: missing or invalid session.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}", wrap = "AuthMiddleware")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .store
        .find_task(task_id.into_inner(), auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Updates `description` and/or `completed` on a task the caller owns.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: any other field in the body, or a validation failure.
/// - `401 Unauthorized`: missing or invalid session.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[patch("/{id}", wrap = "AuthMiddleware")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let update = task_data.into_inner().normalized();
    update.validate()?;

    let mut task = state
        .store
        .find_task(task_id.into_inner(), auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    task.apply(update);

    let result = state
        .store
        .update_task(&task)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a task the caller owns and returns it.
///
/// ## Responses:
/// - `200 OK`: the removed `Task`.
/// - `401 Unauthorized`: missing or invalid session.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}", wrap = "AuthMiddleware")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<Uuid>,
    auth: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = state
        .store
        .delete_task(task_id.into_inner(), auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

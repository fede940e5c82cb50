//! Persistence seam.
//!
//! Handlers talk to a `Store` rather than to a connection pool directly. `PgStore` is the
//! production implementation; `MemoryStore` keeps everything in process memory and backs
//! the test suite and `DATABASE_URL=memory://` runs.
//!
//! Every task operation takes the owner's id and only ever touches that owner's rows.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Session, Task, TaskFilter, User};

#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a new user. A taken email is reported as `AppError::BadRequest`.
    async fn insert_user(&self, user: &User) -> Result<User, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    /// Overwrites name, email, password digest and age, and bumps `updated_at`.
    async fn update_user(&self, user: &User) -> Result<User, AppError>;
    /// Removes the user's tasks, sessions and avatar together with the user row, as one unit:
    /// either everything goes or nothing does. `None` when no such user existed.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<AccountRemoval>, AppError>;

    async fn set_avatar(&self, user_id: Uuid, avatar: Option<Vec<u8>>) -> Result<(), AppError>;
    async fn find_avatar(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError>;

    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;
    async fn find_session(&self, token: &str) -> Result<Option<Session>, AppError>;
    async fn delete_session(&self, token: &str) -> Result<bool, AppError>;
    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, AppError>;
    /// Drops the user's sessions whose expiry is at or before `now`.
    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    async fn insert_task(&self, task: &Task) -> Result<Task, AppError>;
    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;
    async fn find_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError>;
    /// First task (oldest first) whose description equals `description` exactly.
    async fn find_task_by_description(
        &self,
        owner: Uuid,
        description: &str,
    ) -> Result<Option<Task>, AppError>;
    /// Writes description and completed back. `None` when the task is gone or not owned.
    async fn update_task(&self, task: &Task) -> Result<Option<Task>, AppError>;
    async fn delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError>;
}

/// What `Store::delete_user_cascade` removed besides the user row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountRemoval {
    pub tasks: u64,
    pub sessions: u64,
}

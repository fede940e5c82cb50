use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountRemoval, Store};
use crate::error::AppError;
use crate::models::task::{SortField, SortOrder};
use crate::models::{Session, Task, TaskFilter, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    avatars: HashMap<Uuid, Vec<u8>>,
    sessions: HashMap<String, Session>,
    // Kept in insertion order, which doubles as creation order.
    tasks: Vec<Task>,
}

/// A `Store` held entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::DatabaseError("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::DatabaseError("memory store lock poisoned".into()))
    }
}

fn email_taken() -> AppError {
    AppError::BadRequest("Email is already registered".into())
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(email_taken());
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(email_taken());
        }
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.age = user.age;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<AccountRemoval>, AppError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }

        let tasks_before = tables.tasks.len();
        tables.tasks.retain(|t| t.owner != id);
        let sessions_before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != id);
        tables.avatars.remove(&id);
        tables.users.remove(&id);

        Ok(Some(AccountRemoval {
            tasks: (tasks_before - tables.tasks.len()) as u64,
            sessions: (sessions_before - tables.sessions.len()) as u64,
        }))
    }

    async fn set_avatar(&self, user_id: Uuid, avatar: Option<Vec<u8>>) -> Result<(), AppError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::NotFound("User not found".into()));
        }
        match avatar {
            Some(bytes) => tables.avatars.insert(user_id, bytes),
            None => tables.avatars.remove(&user_id),
        };
        Ok(())
    }

    async fn find_avatar(&self, user_id: Uuid) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.read()?.avatars.get(&user_id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        self.write()?
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, AppError> {
        Ok(self.read()?.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.write()?.sessions.remove(token).is_some())
    }

    async fn delete_sessions_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut tables = self.write()?;
        let before = tables.sessions.len();
        tables
            .sessions
            .retain(|_, s| s.user_id != user_id || s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn insert_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&task.owner) {
            return Err(AppError::DatabaseError(format!(
                "task owner {} does not exist",
                task.owner
            )));
        }
        tables.tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn list_tasks(&self, owner: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tables = self.read()?;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.owner == owner)
            .filter(|t| filter.completed.map_or(true, |c| t.completed == c))
            .cloned()
            .collect();

        if let Some(sort) = filter.sort {
            // Stable, so ties keep creation order.
            tasks.sort_by(|a, b| {
                let ordering = match sort.field {
                    SortField::Description => a.description.cmp(&b.description),
                    SortField::Completed => a.completed.cmp(&b.completed),
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                };
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        Ok(tasks
            .into_iter()
            .skip(filter.skip as usize)
            .take(filter.limit.map_or(usize::MAX, |l| l as usize))
            .collect())
    }

    async fn find_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self
            .read()?
            .tasks
            .iter()
            .find(|t| t.id == id && t.owner == owner)
            .cloned())
    }

    async fn find_task_by_description(
        &self,
        owner: Uuid,
        description: &str,
    ) -> Result<Option<Task>, AppError> {
        Ok(self
            .read()?
            .tasks
            .iter()
            .find(|t| t.owner == owner && t.description == description)
            .cloned())
    }

    async fn update_task(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut tables = self.write()?;
        let stored = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id && t.owner == task.owner);
        Ok(stored.map(|stored| {
            stored.description = task.description.clone();
            stored.completed = task.completed;
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid, owner: Uuid) -> Result<Option<Task>, AppError> {
        let mut tables = self.write()?;
        let position = tables
            .tasks
            .iter()
            .position(|t| t.id == id && t.owner == owner);
        Ok(position.map(|index| tables.tasks.remove(index)))
    }
}

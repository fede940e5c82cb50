use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// What needs doing.
    pub description: String,
    /// Whether the task is done.
    pub completed: bool,
    /// Identifier of the user who owns the task. Never changes after creation.
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input structure for creating a task.
///
/// Unknown fields are ignored, in particular any `owner` sent by the client: the owner is
/// always the authenticated caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Body of `PATCH /tasks/{id}`. Only these two fields may be changed.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskInput {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_string(),
            completed: self.completed,
        }
    }
}

impl TaskUpdate {
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.map(|d| d.trim().to_string()),
            completed: self.completed,
        }
    }
}

/// Body of `GET /task`.
#[derive(Debug, Deserialize)]
pub struct DescriptionLookup {
    pub description: String,
}

/// Query parameters accepted by `GET /tasks`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Only tasks with this completion state. An empty value means no filter.
    #[serde(default, deserialize_with = "optional_flag")]
    pub completed: Option<bool>,
    /// Page size. Zero means no limit.
    pub limit: Option<u32>,
    /// Number of matching tasks to skip.
    pub skip: Option<u32>,
    /// `<field>:asc` or `<field>:desc`.
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "completed must be true or false, got {:?}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Description,
    Completed,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Description => "description",
            SortField::Completed => "completed",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TaskSort {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let (field, order) = raw.split_once(':').ok_or_else(|| {
            AppError::ValidationError(format!(
                "sortBy must look like <field>:asc or <field>:desc, got {:?}",
                raw
            ))
        })?;
        let field = match field {
            "description" => SortField::Description,
            "completed" => SortField::Completed,
            "createdAt" | "created_at" => SortField::CreatedAt,
            "updatedAt" | "updated_at" => SortField::UpdatedAt,
            other => {
                return Err(AppError::ValidationError(format!(
                    "Cannot sort tasks by {:?}",
                    other
                )))
            }
        };
        let order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => {
                return Err(AppError::ValidationError(format!(
                    "Sort direction must be asc or desc, got {:?}",
                    other
                )))
            }
        };
        Ok(Self { field, order })
    }
}

/// A validated listing request, ready to hand to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub sort: Option<TaskSort>,
    pub limit: Option<u32>,
    pub skip: u32,
}

impl TryFrom<TaskQuery> for TaskFilter {
    type Error = AppError;

    fn try_from(query: TaskQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            completed: query.completed,
            sort: query.sort_by.as_deref().map(TaskSort::parse).transpose()?,
            limit: query.limit.filter(|limit| *limit > 0),
            skip: query.skip.unwrap_or(0),
        })
    }
}

impl Task {
    /// Creates a new `Task` owned by `owner` with fresh timestamps and id.
    pub fn new(input: TaskInput, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: input.description,
            completed: input.completed,
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch in place. The caller persists the result.
    pub fn apply(&mut self, update: TaskUpdate) {
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

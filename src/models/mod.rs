pub mod session;
pub mod task;
pub mod user;

pub use session::Session;
pub use task::{DescriptionLookup, Task, TaskFilter, TaskInput, TaskQuery, TaskSort, TaskUpdate};
pub use user::{LoginRequest, RegisterRequest, UpdateUserRequest, User};

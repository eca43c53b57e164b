/// Domain models for TeamTask
///
/// # Models
///
/// - `role`: The four-level reporting hierarchy
/// - `user`: User accounts, status lifecycle and reporting links
/// - `task`: Tasks, their status state machine and edits
///
/// Models are plain data. Persistence belongs to the host application; the
/// decision logic that reads these models lives in [`crate::directory`],
/// [`crate::hierarchy`], [`crate::assignment`] and
/// [`crate::auth::authorization`].

pub mod role;
pub mod task;
pub mod user;

pub use role::Role;
pub use task::{Priority, Task, TaskStatus};
pub use user::{User, UserStatus};

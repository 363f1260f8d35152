pub mod config;
pub mod domain;
pub mod errors;

pub use domain::task::{NewTask, Task, TaskId, TaskStatus, TeamMember};
pub use errors::{ApplicationError, DomainError, InterfaceError};

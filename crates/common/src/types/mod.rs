pub mod command;
pub mod resource;

pub use command::{CommandState, CommandStatus, UnknownCommandState};
pub use resource::{ManagedKsql, ManagedKsqlStatus, ResourceKey, ResourceKeyError, ResourceStatus};

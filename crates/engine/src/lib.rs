//! Reconciliation of declared KSQL statements against a ksqlDB server.
//!
//! [`Controller::reconcile`] is the single entry point: it reads a resource
//! from a [`ResourceStore`], parses and orders its statements (cached per
//! resource version), applies each one through the [`Reconciler`], drops
//! whatever is no longer declared and writes the status back.
//! [`Controller::run`] drives it from a [`WorkQueue`] with a pool of workers.

pub mod cache;
pub mod command_id;
pub mod controller;
pub mod error;
pub mod queue;
pub mod reconciler;
pub mod store;

pub use cache::{CacheItem, StateCache};
pub use command_id::{parse_command_id, CommandRef};
pub use controller::Controller;
pub use error::ReconcileError;
pub use queue::WorkQueue;
pub use reconciler::Reconciler;
pub use store::{MemoryResourceStore, ResourceStore, StoreError};

//! Clients for the remote systems the operator talks to.

pub mod error;
pub mod ksql;
pub mod models;

pub use error::KsqlClientError;
pub use ksql::{KsqlApi, KsqlClient, CONTENT_TYPE, ERROR_CODE_NOT_FOUND};
pub use models::KsqlResponse;

//! Route table error types.

use thiserror::Error;

/// Errors raised while building the route table.
///
/// All of these surface at startup; resolving a request never fails with one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("duplicate route {method} {pattern}: first registration wins")]
    Duplicate { method: String, pattern: String },
}

pub type RouteResult<T> = Result<T, RouteError>;

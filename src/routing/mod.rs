//! Routing module
//!
//! Provides method + path-pattern routing:
//! - `{name}` placeholder segments captured into `PathParams`
//! - First-registered-wins resolution
//! - Duplicate registrations rejected at build time

mod error;
mod pattern;
mod table;

pub use error::RouteError;
pub use pattern::PathParams;
pub use table::{MethodFilter, Resolution, RouteTable};

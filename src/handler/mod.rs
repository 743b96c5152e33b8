//! Request handler module
//!
//! Request dispatch plus the endpoint handlers it routes to.

pub mod endpoints;
pub mod request;
pub mod router;
pub mod routes;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::routing::PathParams;
use request::InboundRequest;

// Re-export main entry points
pub use router::handle_request;
pub use routes::build_route_table;

/// Signature shared by every endpoint
pub type HandlerFn = fn(&InboundRequest, &PathParams) -> Response<Full<Bytes>>;

/// A named handler, stored in the route table
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub name: &'static str,
    pub handle: HandlerFn,
}

impl Endpoint {
    pub const fn new(name: &'static str, handle: HandlerFn) -> Self {
        Self { name, handle }
    }
}

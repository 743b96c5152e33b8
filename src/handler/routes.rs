//! Route registration
//!
//! Builds the server's route table once at startup.

use hyper::Method;

use super::endpoints;
use super::Endpoint;
use crate::config::RoutingConfig;
use crate::logger;
use crate::routing::{MethodFilter, RouteError, RouteTable};

/// Bindings in registration order
///
/// `/hello` is bound twice for GET; the second registration is reported as a
/// duplicate and never serves a request.
fn bindings() -> Vec<(MethodFilter, &'static str, Endpoint)> {
    vec![
        (Method::GET.into(), "/hello", Endpoint::new("hello", endpoints::hello)),
        (Method::GET.into(), "/hello", Endpoint::new("postHello", endpoints::post_hello)),
        (
            Method::GET.into(),
            "/print/{what_to_print}",
            Endpoint::new("print", endpoints::print),
        ),
        (Method::GET.into(), "/system", Endpoint::new("getSystemInfo", endpoints::system_info)),
        (
            MethodFilter::Any,
            "/request-info/{params}",
            Endpoint::new("requestInfo", endpoints::request_info),
        ),
    ]
}

/// Build the route table
///
/// Duplicate bindings are logged and skipped unless `reject_duplicates` is set,
/// in which case the first one aborts startup.
pub fn build_route_table(config: &RoutingConfig) -> Result<RouteTable<Endpoint>, RouteError> {
    let mut table = RouteTable::new();

    for (method, pattern, endpoint) in bindings() {
        let method_name = method.to_string();
        match table.register(method, pattern, endpoint) {
            Ok(()) => logger::log_route_registered(&method_name, pattern, endpoint.name),
            Err(e @ RouteError::Duplicate { .. }) if !config.reject_duplicates => {
                logger::log_warning(&format!("{e}; ignoring handler '{}'", endpoint.name));
            }
            Err(e) => return Err(e),
        }
    }

    logger::log_debug(&format!("{} routes registered", table.bindings().len()));
    Ok(table)
}

// Application state module
// Configuration and route table, frozen at startup and shared by every connection

use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::handler::Endpoint;
use crate::routing::RouteTable;

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable<Endpoint>,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub const fn new(config: Config, routes: RouteTable<Endpoint>) -> Self {
        Self {
            config,
            routes,
            active_connections: AtomicUsize::new(0),
        }
    }
}

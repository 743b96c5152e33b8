//! Route table module
//!
//! Ordered (method, pattern, handler) bindings. Resolution walks the bindings
//! in registration order, so the first registered match wins.

use hyper::Method;

use super::error::{RouteError, RouteResult};
use super::pattern::{PathParams, RoutePattern};

/// Which request methods a binding accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(expected) => expected == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl std::fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Only(method) => write!(f, "{method}"),
        }
    }
}

/// A single route binding
#[derive(Debug, Clone)]
pub struct RouteBinding<H> {
    pub method: MethodFilter,
    pub pattern: RoutePattern,
    pub handler: H,
}

/// Outcome of looking up a request
#[derive(Debug)]
pub enum Resolution<'a, H> {
    Matched {
        binding: &'a RouteBinding<H>,
        params: PathParams,
    },
    /// The path is known but no binding accepts the method
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Ordered route table, immutable once handed to the dispatcher
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    bindings: Vec<RouteBinding<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding
    ///
    /// Registering the same (method, pattern) twice is rejected and the table
    /// keeps the first binding untouched.
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: H,
    ) -> RouteResult<()> {
        let method = method.into();
        let pattern = RoutePattern::parse(pattern)?;

        if self
            .bindings
            .iter()
            .any(|b| b.method == method && b.pattern == pattern)
        {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                pattern: pattern.to_string(),
            });
        }

        self.bindings.push(RouteBinding {
            method,
            pattern,
            handler,
        });
        Ok(())
    }

    /// Find the first binding matching `method` and `path`
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_, H> {
        let mut allowed: Vec<Method> = Vec::new();

        for binding in &self.bindings {
            let Some(params) = binding.pattern.matches(path) else {
                continue;
            };
            if binding.method.allows(method) {
                return Resolution::Matched { binding, params };
            }
            if let MethodFilter::Only(m) = &binding.method {
                if !allowed.contains(m) {
                    allowed.push(m.clone());
                }
            }
        }

        if allowed.is_empty() {
            Resolution::NotFound
        } else {
            Resolution::MethodNotAllowed(allowed)
        }
    }

    /// Bindings in registration order
    pub fn bindings(&self) -> &[RouteBinding<H>] {
        &self.bindings
    }
}

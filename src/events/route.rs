//! Routes and deferred resolvers.
//!
//! An [`IncomingBrowserEvent`](crate::events::IncomingBrowserEvent) is created
//! before the router and the auth layer exist, yet its lookups need both. The
//! event therefore holds two *resolvers*: zero-argument suppliers that are
//! bound after construction and called on every lookup. An unbound resolver
//! behaves like one that returns `None`.

use std::any::Any;
use std::sync::Arc;

use serde_json::{Map, Value};

/// A matched route, as seen by the event.
pub trait Route: Send + Sync {
    /// All route parameters.
    fn params(&self) -> &Map<String, Value>;

    /// A single route parameter.
    fn get_param(&self, name: &str) -> Option<Value> {
        self.params().get(name).cloned()
    }
}

/// Supplies the current route, if any.
pub type RouteResolver = Arc<dyn Fn() -> Option<Arc<dyn Route>> + Send + Sync>;

/// Supplies the current user, if any. Callers downcast to their own user type.
pub type UserResolver = Arc<dyn Fn() -> Option<Arc<dyn Any + Send + Sync>> + Send + Sync>;

/// Map-backed [`Route`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams {
    params: Map<String, Value>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param<K: Into<String>, V: Into<Value>>(mut self, name: K, value: V) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl From<Map<String, Value>> for RouteParams {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

impl Route for RouteParams {
    fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

/// A route resolver that always returns `None`.
pub(crate) fn unbound_route() -> RouteResolver {
    Arc::new(|| None)
}

/// A user resolver that always returns `None`.
pub(crate) fn unbound_user() -> UserResolver {
    Arc::new(|| None)
}

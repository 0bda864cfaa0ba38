// src/events.rs
//! Browser events: [`IncomingBrowserEvent`], [`OutgoingBrowserResponse`] and routing hooks.

mod incoming;
mod options;
mod outgoing;
mod route;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use incoming::IncomingBrowserEvent;
pub use options::{IncomingBrowserEventBuilder, IncomingBrowserEventOptions};
pub use outgoing::{OutgoingBrowserResponse, OutgoingBrowserResponseBuilder};
pub use route::{Route, RouteParams, RouteResolver, UserResolver};

/// A unique identifier for an event, represented as a UUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EventId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

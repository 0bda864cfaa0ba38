//! Cookie documents: the optional backing store of a [`CookieCollection`].
//!
//! A **cookie document** is any external object exposing one string property
//! that holds every cookie currently visible (think `document.cookie` in a
//! browser):
//! - *reading* it returns the full `name=value; name2=value2` string;
//! - *writing* one directive (`name=value; Path=/; Max-Age=...`) sets or
//!   deletes exactly that one cookie.
//!
//! A collection only reads the document once, when it is created, and after
//! that only ever writes to it. The document is never asked to "delete"
//! anything; deletion is a write with `Max-Age=-1`.
//!
//! ## Design notes
//! - Documents are owned by the caller and shared with collections through a
//!   [`DocumentHandle`]. Collections never close or reset them.
//! - Implementations must be `Send + Sync` and synchronize internally, since
//!   trait methods take `&self`.
//!
//! [`CookieCollection`]: crate::cookies::CookieCollection

mod in_memory;

use std::sync::Arc;

pub use in_memory::InMemoryCookieDocument;

/// A handle to a type-erased cookie document.
pub type DocumentHandle = Arc<dyn CookieDocument>;

/// A mutable string-backed cookie store.
pub trait CookieDocument: Send + Sync {
    /// Returns every cookie currently visible, as `name=value; name2=value2`.
    fn cookie(&self) -> String;

    /// Writes a single cookie directive.
    ///
    /// Writes are best-effort from the collection's point of view: an error is
    /// logged by the caller and otherwise ignored.
    fn set_cookie(&self, directive: &str) -> anyhow::Result<()>;
}

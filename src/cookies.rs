// src/cookies.rs
//! Cookies: [`Cookie`], [`CookieCollection`] and cookie documents.

mod collection;
mod cookies;
mod document;
mod grammar;
mod options;

pub use cookies::Cookie;
pub use cookies::STRUCTURED_VALUE_PREFIX;

pub use collection::CookieCollection;

pub use document::CookieDocument;
pub use document::DocumentHandle;
pub use document::InMemoryCookieDocument;

pub use options::CookieOptions;
pub use options::SameSite;

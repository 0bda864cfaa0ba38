//! Cookie collection with optional document synchronization.
//!
//! A [`CookieCollection`] holds at most one [`Cookie`] per name, in insertion
//! order. It is parsed once from a raw cookie string (or from an attached
//! [`CookieDocument`](crate::cookies::CookieDocument)) and from then on is the
//! single source of truth: it never re-reads the document.
//!
//! ## Synchronization
//! When a document is attached, every mutating call pushes the affected
//! cookie(s) to it right away, one directive per cookie:
//!
//! | call          | document writes                                   |
//! |---------------|---------------------------------------------------|
//! | `add`         | the new cookie                                    |
//! | `update`      | the updated cookie (nothing if the name is unknown) |
//! | `remove`      | `name=; Max-Age=-1` plus the cookie's attributes  |
//! | `secure`      | every cookie, with `Secure` toggled               |
//! | `set_options` | every cookie, with the new options merged in      |
//! | `clear`       | **nothing**                                       |
//!
//! Writes are best-effort: a failing write is logged and the remaining work
//! continues. Sweeps (`secure`, `set_options`) are not atomic.
//!
//! ```rust
//! use std::sync::Arc;
//! use gosub_browser_event::cookies::{CookieCollection, CookieDocument, CookieOptions, InMemoryCookieDocument};
//!
//! let doc = Arc::new(InMemoryCookieDocument::with_cookie_string("a=1; b=2"));
//! let mut cookies = CookieCollection::create(None, CookieOptions::default(), Some(doc.clone())).unwrap();
//!
//! cookies.remove("a");
//! assert!(!cookies.has("a"));
//! assert_eq!(doc.last_write().as_deref(), Some("a=; Max-Age=-1"));
//! assert_eq!(doc.cookie(), "b=2");
//! ```

use std::fmt;

use serde_json::Value;

use crate::cookies::document::DocumentHandle;
use crate::cookies::{grammar, Cookie, CookieOptions};
use crate::errors::BrowserError;

/// An ordered, unique-by-name set of cookies.
#[derive(Clone, Default)]
pub struct CookieCollection {
    /// Defaults applied to every cookie created by this collection.
    options: CookieOptions,
    /// Cookies in insertion order. Names are unique.
    cookies: Vec<Cookie>,
    /// Optional backing store that mutations are mirrored to.
    document: Option<DocumentHandle>,
}

impl fmt::Debug for CookieCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieCollection")
            .field("options", &self.options)
            .field("cookies", &self.cookies)
            .field("document", &self.document.is_some())
            .finish()
    }
}

impl CookieCollection {
    /// Creates an empty collection without a document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection from `raw` (`a=1; b=2`).
    ///
    /// When `raw` is `None` and a document is given, the document's current
    /// cookie string is read once instead. With neither, the collection is empty.
    ///
    /// Fails with [`BrowserError::Decode`] if a value carries the structured-value
    /// prefix but is not valid JSON.
    pub fn create(
        raw: Option<&str>,
        options: CookieOptions,
        document: Option<DocumentHandle>,
    ) -> Result<Self, BrowserError> {
        let raw = match (raw, &document) {
            (Some(raw), _) => Some(raw.to_string()),
            (None, Some(doc)) => Some(doc.cookie()),
            (None, None) => None,
        };

        let cookies = match raw {
            Some(raw) => grammar::parse(&raw)
                .into_iter()
                .map(|(name, value)| Cookie::create(name, value, options.clone()))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        log::debug!("cookie collection created with {} cookie(s)", cookies.len());

        Ok(Self {
            options,
            cookies,
            document,
        })
    }

    /// Adds (or replaces) a cookie. Options are merged over the collection defaults.
    pub fn add<N, V>(&mut self, name: N, value: V, options: CookieOptions) -> Result<&mut Self, BrowserError>
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let cookie = Cookie::create(name, value, self.options.merge(&options))?;
        self.save_cookie(&cookie);
        self.store(cookie);
        Ok(self)
    }

    /// Replaces the value of an existing cookie, keeping its current attributes
    /// merged with `options`. Does nothing when `name` is unknown.
    pub fn update<V: Into<Value>>(
        &mut self,
        name: &str,
        value: V,
        options: CookieOptions,
    ) -> Result<&mut Self, BrowserError> {
        if let Some(current) = self.get(name) {
            let cookie = current.clone_with(value, &options)?;
            self.save_cookie(&cookie);
            self.store(cookie);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name() == name)
    }

    /// Returns the cookie called `name`, or `fallback` if there is none.
    pub fn get_or<'a>(&'a self, name: &str, fallback: &'a Cookie) -> &'a Cookie {
        self.get(name).unwrap_or(fallback)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a cookie and tells the document to expire it. Does nothing when `name` is unknown.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        if let Some(pos) = self.cookies.iter().position(|c| c.name() == name) {
            let current = self.cookies.remove(pos);
            if self.document.is_some() {
                match current.clone_with("", &CookieOptions::new().with_max_age(-1)) {
                    Ok(removal) => self.save_cookie(&removal),
                    Err(e) => log::warn!("cannot build removal cookie for {name}: {e}"),
                }
            }
        }
        self
    }

    /// All cookies, in insertion order.
    pub fn all(&self) -> Vec<&Cookie> {
        self.cookies.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Drops every cookie from the collection. The document is **not** notified.
    pub fn clear(&mut self) -> &mut Self {
        self.cookies.clear();
        self
    }

    /// Sets (or clears) the `Secure` flag on every cookie and writes each one back.
    pub fn secure(&mut self, secure: bool) -> &mut Self {
        let overrides = CookieOptions::new().with_secure(secure);
        self.sweep(&overrides);
        self
    }

    /// Replaces the collection defaults and re-derives every cookie with them.
    pub fn set_options(&mut self, options: CookieOptions) -> &mut Self {
        self.sweep(&options);
        self.options = options;
        self
    }

    /// The defaults applied to new cookies.
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    /// Renders the collection as a `Cookie` request header value (`a=1; b=2`).
    ///
    /// Returns `None` when the collection is empty.
    pub fn to_header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|c| grammar::serialize_pair(c.name(), &c.encoded_value()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn sweep(&mut self, overrides: &CookieOptions) {
        for i in 0..self.cookies.len() {
            let cookie = self.cookies[i].with_options(overrides);
            self.save_cookie(&cookie);
            self.cookies[i] = cookie;
        }
    }

    fn store(&mut self, cookie: Cookie) {
        // Replace existing cookie with same name
        if let Some(existing) = self.cookies.iter_mut().find(|c| c.name() == cookie.name()) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    fn save_cookie(&self, cookie: &Cookie) {
        let Some(document) = &self.document else {
            return;
        };

        let directive = cookie.serialize();
        log::debug!("writing cookie directive: {directive}");
        if let Err(e) = document.set_cookie(&directive) {
            log::warn!("failed to write cookie {} to document: {e}", cookie.name());
        }
    }
}

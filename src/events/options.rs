//! Construction options for [`IncomingBrowserEvent`].
//!
//! `IncomingBrowserEventOptions` is a plain options record with sensible
//! defaults via [`Default`], plus a fluent [`IncomingBrowserEventOptions::builder()`]
//! that validates and constructs the event in one go.
//!
//! # Examples
//!
//! ```rust
//! use gosub_browser_event::events::IncomingBrowserEvent;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let event = IncomingBrowserEvent::builder()
//!     .url("https://example.com/users/42?tab=posts")
//!     .protocol("https")
//!     .query_string("tab=posts")
//!     .cookie_header("theme=dark")
//!     .metadata_value("tenant", "acme")
//!     .build()?; // returns Result<IncomingBrowserEvent, BrowserError>
//!
//! assert!(event.is_secure());
//! assert_eq!(event.get("theme").unwrap(), Some("dark".into()));
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `url`: Required. Must parse as an absolute URL.
//! - `protocol`: `"http"` or `"https"` (default: `"http"`).
//! - `query_string`: Raw query string; a leading `?` is ignored (default: empty).
//! - `cookies`: Pre-built collection. When absent, the `Cookie` header(s) in
//!   `headers` are parsed instead; without those the collection is empty.
//! - `headers`: Request headers (default: empty).
//! - `metadata`: Free-form values, the last stop of [`IncomingBrowserEvent::get`].
//! - `locale`: Default `"en"`.
//! - `source`: Opaque value describing where the event came from.
//!
//! # Errors
//!
//! Building fails with [`BrowserError::MissingUrl`] / [`BrowserError::InvalidUrl`]
//! when the URL is absent or malformed, and with [`BrowserError::Decode`] when a
//! `Cookie` header carries a broken structured value.

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use serde_json::{Map, Value};

use crate::cookies::CookieCollection;
use crate::errors::BrowserError;
use crate::events::IncomingBrowserEvent;

#[derive(Debug, Clone, Default)]
pub struct IncomingBrowserEventOptions {
    pub url: Option<String>,
    pub protocol: Option<String>,
    pub query_string: Option<String>,
    pub cookies: Option<CookieCollection>,
    pub headers: HeaderMap,
    pub metadata: Map<String, Value>,
    pub locale: Option<String>,
    pub source: Option<Value>,
}

impl IncomingBrowserEventOptions {
    pub fn builder() -> IncomingBrowserEventBuilder {
        IncomingBrowserEventBuilder::default()
    }
}

/// Builder for [`IncomingBrowserEvent`].
#[derive(Debug, Clone, Default)]
pub struct IncomingBrowserEventBuilder {
    inner: IncomingBrowserEventOptions,
}

impl IncomingBrowserEventBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut IncomingBrowserEventOptions)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn url<S: AsRef<str>>(self, url: S) -> Self { self.map(|o| o.url = Some(url.as_ref().to_string())) }
    pub fn protocol<S: Into<String>>(self, protocol: S) -> Self { self.map(|o| o.protocol = Some(protocol.into())) }
    pub fn query_string<S: Into<String>>(self, qs: S) -> Self { self.map(|o| o.query_string = Some(qs.into())) }
    pub fn cookies(self, cookies: CookieCollection) -> Self { self.map(|o| o.cookies = Some(cookies)) }
    pub fn headers(self, headers: HeaderMap) -> Self { self.map(|o| o.headers = headers) }
    pub fn metadata(self, metadata: Map<String, Value>) -> Self { self.map(|o| o.metadata = metadata) }
    pub fn locale<S: Into<String>>(self, locale: S) -> Self { self.map(|o| o.locale = Some(locale.into())) }
    pub fn source<V: Into<Value>>(self, source: V) -> Self { self.map(|o| o.source = Some(source.into())) }

    /// Adds a single metadata entry.
    pub fn metadata_value<K: Into<String>, V: Into<Value>>(self, key: K, value: V) -> Self {
        self.map(|o| {
            o.metadata.insert(key.into(), value.into());
        })
    }

    /// Appends a `Cookie` request header. Invalid header values are ignored.
    pub fn cookie_header<S: AsRef<str>>(self, raw: S) -> Self {
        self.header(http::header::COOKIE, raw)
    }

    /// Appends a request header. Invalid header values are ignored.
    pub fn header<S: AsRef<str>>(self, name: HeaderName, value: S) -> Self {
        self.map(|o| match HeaderValue::from_str(value.as_ref()) {
            Ok(v) => {
                o.headers.append(name, v);
            }
            Err(e) => log::warn!("ignoring invalid value for header {name}: {e}"),
        })
    }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut IncomingBrowserEventOptions)) -> Self { self.map(f) }

    /// The options collected so far.
    pub fn options(self) -> IncomingBrowserEventOptions {
        self.inner
    }

    /// Validate and build the event.
    pub fn build(self) -> Result<IncomingBrowserEvent, BrowserError> {
        IncomingBrowserEvent::create(self.inner)
    }
}

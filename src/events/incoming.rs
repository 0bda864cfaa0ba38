//! The incoming browser event.
//!
//! [`IncomingBrowserEvent`] describes one navigation inside the browser: its
//! URL, query parameters, cookies and free-form metadata. Its generic
//! [`get`](IncomingBrowserEvent::get) accessor looks a key up in a fixed order
//! and returns the first value found:
//!
//! 1. route parameters (through the bound route resolver),
//! 2. query parameters,
//! 3. cookies (exact name, then lower-cased),
//! 4. metadata.
//!
//! JSON `null` counts as "not found" at every step.
//!
//! ```rust
//! use std::sync::Arc;
//! use gosub_browser_event::events::{IncomingBrowserEvent, Route, RouteParams};
//!
//! let mut event = IncomingBrowserEvent::builder()
//!     .url("http://localhost/deploy")
//!     .query_string("env=qa")
//!     .build()
//!     .unwrap();
//! assert_eq!(event.get("env").unwrap(), Some("qa".into()));
//!
//! let route: Arc<dyn Route> = Arc::new(RouteParams::new().with_param("env", "prod"));
//! event.set_route_resolver(move || Some(route.clone()));
//! assert_eq!(event.get("env").unwrap(), Some("prod".into()));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::Url;

use crate::cookies::{Cookie, CookieCollection, CookieOptions};
use crate::errors::BrowserError;
use crate::events::options::{IncomingBrowserEventBuilder, IncomingBrowserEventOptions};
use crate::events::route::{unbound_route, unbound_user, Route, RouteResolver, UserResolver};
use crate::events::EventId;

/// Browser-side request event.
#[derive(Clone)]
pub struct IncomingBrowserEvent {
    id: EventId,
    url: Url,
    method: Method,
    protocol: String,
    query_string: Option<String>,
    query: Vec<(String, String)>,
    cookies: CookieCollection,
    headers: HeaderMap,
    metadata: Map<String, Value>,
    locale: String,
    source: Option<Value>,

    route_resolver: Option<RouteResolver>,
    user_resolver: Option<UserResolver>,
}

impl fmt::Debug for IncomingBrowserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingBrowserEvent")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("protocol", &self.protocol)
            .field("query", &self.query)
            .field("cookies", &self.cookies)
            .field("metadata", &self.metadata)
            .field("locale", &self.locale)
            .field("route_resolver", &self.route_resolver.is_some())
            .field("user_resolver", &self.user_resolver.is_some())
            .finish()
    }
}

impl IncomingBrowserEvent {
    pub const EVENT_TYPE: &'static str = "incoming_browser_event";

    pub fn builder() -> IncomingBrowserEventBuilder {
        IncomingBrowserEventOptions::builder()
    }

    /// Creates an event from `options`.
    ///
    /// Fails when the URL is missing or not a valid absolute URL, or when a
    /// `Cookie` header holds a broken structured value.
    pub fn create(options: IncomingBrowserEventOptions) -> Result<Self, BrowserError> {
        let raw_url = options.url.ok_or(BrowserError::MissingUrl)?;
        let url = Url::parse(&raw_url).map_err(|source| BrowserError::InvalidUrl { url: raw_url, source })?;

        let cookies = match options.cookies {
            Some(cookies) => cookies,
            None => cookies_from_headers(&options.headers)?,
        };

        let query = url::form_urlencoded::parse(
            options
                .query_string
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('?')
                .as_bytes(),
        )
        .into_owned()
        .collect();

        let event = Self {
            id: EventId::new(),
            url,
            method: Method::GET,
            protocol: options.protocol.unwrap_or_else(|| "http".to_string()),
            query_string: options.query_string,
            query,
            cookies,
            headers: options.headers,
            metadata: options.metadata,
            locale: options.locale.unwrap_or_else(|| "en".to_string()),
            source: options.source,
            route_resolver: None,
            user_resolver: None,
        };

        log::debug!("incoming browser event {} created for {}", event.id, event.url);
        Ok(event)
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Browser navigations are always `GET`.
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_method(&self, method: &Method) -> bool {
        &self.method == method
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Decoded query parameters, in order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of the query parameter `key`.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> &CookieCollection {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieCollection {
        &mut self.cookies
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn source(&self) -> Option<&Value> {
        self.source.as_ref()
    }

    // ---------- URL accessors ----------

    /// The percent-decoded pathname, or `None` if it holds a malformed escape
    /// or does not decode to UTF-8.
    pub fn decoded_pathname(&self) -> Option<String> {
        decode_uri_component(self.url.path())
    }

    /// The fragment including its `#`, or an empty string.
    pub fn hash(&self) -> String {
        match self.url.fragment() {
            Some(f) if !f.is_empty() => format!("#{f}"),
            _ => String::new(),
        }
    }

    /// `hostname[:port]`; the port is left out when it is the scheme default.
    pub fn host(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{port}", self.hostname()),
            None => self.hostname().to_string(),
        }
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Parameters of the current route, if a route resolves.
    pub fn params(&self) -> Option<Map<String, Value>> {
        self.get_route().map(|route| route.params().clone())
    }

    /// Pathname plus `?query` when there is one.
    pub fn path(&self) -> String {
        match self.url.query() {
            Some(q) if !q.is_empty() => format!("{}?{q}", self.url.path()),
            _ => self.url.path().to_string(),
        }
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// The full URL.
    pub fn uri(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        &self.protocol
    }

    pub fn segments(&self) -> Vec<&str> {
        self.url.path().split('/').collect()
    }

    pub fn is_secure(&self) -> bool {
        self.protocol == "https"
    }

    /// Resolves `path` against the event URL.
    pub fn uri_for_path(&self, path: &str) -> Result<String, BrowserError> {
        self.url
            .join(path)
            .map(String::from)
            .map_err(|source| BrowserError::InvalidUrl { url: path.to_string(), source })
    }

    /// The decoded pathname, optionally as a full URL on the event's origin.
    ///
    /// With `with_domain`, a pathname that cannot be decoded falls back to `/`.
    pub fn get_uri(&self, with_domain: bool) -> Option<String> {
        let decoded = self.decoded_pathname();
        if !with_domain {
            return decoded;
        }

        self.url
            .join(decoded.as_deref().unwrap_or("/"))
            .ok()
            .map(String::from)
    }

    // ---------- Resolver chain ----------

    /// Looks `key` up in route params, query params, cookies and metadata, in that order.
    ///
    /// Reaching the cookie step with a blank key fails with
    /// [`BrowserError::InvalidCookieName`].
    pub fn get(&self, key: &str) -> Result<Option<Value>, BrowserError> {
        if let Some(value) = defined(self.get_param(key)) {
            return Ok(Some(value));
        }
        if let Some(value) = self.query_param(key) {
            return Ok(Some(Value::String(value.to_string())));
        }
        if let Some(value) = defined(self.get_cookie(key)?.map(|c| c.value().clone())) {
            return Ok(Some(value));
        }
        Ok(defined(self.metadata_value(key).cloned()))
    }

    /// Like [`get`](Self::get), with a fallback when nothing is found.
    pub fn get_or<V: Into<Value>>(&self, key: &str, fallback: V) -> Result<Value, BrowserError> {
        Ok(self.get(key)?.unwrap_or_else(|| fallback.into()))
    }

    /// Like [`get`](Self::get), deserializing the value found into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, BrowserError> {
        self.get(key)?
            .map(|value| serde_json::from_value(value).map_err(BrowserError::from))
            .transpose()
    }

    /// Finds a cookie by exact name, then by its lower-cased name.
    ///
    /// Blank names are rejected with [`BrowserError::InvalidCookieName`].
    pub fn get_cookie(&self, name: &str) -> Result<Option<&Cookie>, BrowserError> {
        validate_cookie_name(name)?;
        Ok(self
            .cookies
            .get(name)
            .or_else(|| self.cookies.get(&name.to_lowercase())))
    }

    /// Like [`get_cookie`](Self::get_cookie), with a fallback when nothing is found.
    pub fn get_cookie_or<'a>(&'a self, name: &str, fallback: &'a Cookie) -> Result<&'a Cookie, BrowserError> {
        Ok(self.get_cookie(name)?.unwrap_or(fallback))
    }

    pub fn has_cookie(&self, name: &str) -> Result<bool, BrowserError> {
        validate_cookie_name(name)?;
        Ok(self.cookies.has(name) || self.cookies.has(&name.to_lowercase()))
    }

    /// Adds a cookie to the event's collection (and its document, if any).
    pub fn set_cookie<V: Into<Value>>(
        &mut self,
        name: &str,
        value: V,
        options: CookieOptions,
    ) -> Result<&mut Self, BrowserError> {
        validate_cookie_name(name)?;
        self.cookies.add(name, value, options)?;
        Ok(self)
    }

    pub fn get_user<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let resolver = self.user_resolver.as_ref()?;
        resolver()?.downcast::<T>().ok()
    }

    pub fn user_resolver(&self) -> UserResolver {
        self.user_resolver.clone().unwrap_or_else(unbound_user)
    }

    pub fn set_user_resolver<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn() -> Option<Arc<dyn Any + Send + Sync>> + Send + Sync + 'static,
    {
        self.user_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn get_route(&self) -> Option<Arc<dyn Route>> {
        let resolver = self.route_resolver.as_ref()?;
        resolver()
    }

    pub fn route_resolver(&self) -> RouteResolver {
        self.route_resolver.clone().unwrap_or_else(unbound_route)
    }

    pub fn set_route_resolver<F>(&mut self, resolver: F) -> &mut Self
    where
        F: Fn() -> Option<Arc<dyn Route>> + Send + Sync + 'static,
    {
        self.route_resolver = Some(Arc::new(resolver));
        self
    }

    /// A single route parameter, if a route resolves and has it.
    pub fn get_param(&self, name: &str) -> Option<Value> {
        self.get_route()?.get_param(name)
    }

}

fn defined(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

fn validate_cookie_name(name: &str) -> Result<(), BrowserError> {
    if name.trim().is_empty() {
        return Err(BrowserError::InvalidCookieName);
    }
    Ok(())
}

fn cookies_from_headers(headers: &HeaderMap) -> Result<CookieCollection, BrowserError> {
    let raw = headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");

    if raw.is_empty() {
        return Ok(CookieCollection::new());
    }

    CookieCollection::create(Some(&raw), CookieOptions::default(), None)
}

/// Strict percent-decoding: every `%` must start a two-digit hex escape and
/// the result must be UTF-8.
fn decode_uri_component(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(s).decode_utf8().ok().map(|s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::{CookieDocument, InMemoryCookieDocument};
    use crate::events::RouteParams;
    use serde_json::json;

    fn event() -> IncomingBrowserEvent {
        IncomingBrowserEvent::builder()
            .url("http://localhost/test#title")
            .protocol("http")
            .locale("en")
            .metadata_value("username", "Jonh")
            .query_string("param1=value1&param2=value2")
            .cookies(CookieCollection::create(Some("test=value; anotherTest=anotherValue"), CookieOptions::default(), None).unwrap())
            .build()
            .unwrap()
    }

    fn route(params: RouteParams) -> impl Fn() -> Option<Arc<dyn Route>> + Send + Sync + 'static {
        let route: Arc<dyn Route> = Arc::new(params);
        move || Some(route.clone())
    }

    #[derive(Debug, PartialEq)]
    struct User {
        name: String,
    }

    #[test]
    fn create_with_defaults() {
        let event = IncomingBrowserEvent::builder().url("http://localhost/").build().unwrap();

        assert_eq!(event.protocol(), "http");
        assert_eq!(event.locale(), "en");
        assert!(event.query().is_empty());
        assert!(event.cookies().is_empty());
        assert!(event.metadata().is_empty());
        assert!(event.source().is_none());
        assert_eq!(event.method(), &Method::GET);
        assert_eq!(event.event_type(), "incoming_browser_event");
    }

    #[test]
    fn each_event_gets_its_own_id() {
        assert_ne!(event().id(), event().id());
    }

    #[test]
    fn create_fails_on_invalid_url() {
        let err = IncomingBrowserEvent::builder().url("invalid-url").build().unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl { .. }));

        let err = IncomingBrowserEvent::create(IncomingBrowserEventOptions::default()).unwrap_err();
        assert!(matches!(err, BrowserError::MissingUrl));
    }

    #[test]
    fn getters() {
        let event = event();

        assert_eq!(event.decoded_pathname().as_deref(), Some("/test"));
        assert_eq!(event.host(), "localhost");
        assert_eq!(event.hash(), "#title");
        assert_eq!(event.hostname(), "localhost");
        assert_eq!(event.pathname(), "/test");
        assert!(event.params().is_none());
        assert_eq!(event.path(), "/test");
        assert_eq!(event.scheme(), "http");
        assert_eq!(event.segments(), vec!["", "test"]);
        assert!(!event.is_secure());
        assert!(!event.is_method(&Method::POST));
        assert!(event.is_method(&Method::GET));
        assert_eq!(event.uri(), "http://localhost/test#title");
        assert!(event.route_resolver()().is_none());
        assert!(event.user_resolver()().is_none());
        assert!(event.get_user::<User>().is_none());
        assert_eq!(event.get_uri(false).as_deref(), Some("/test"));
        assert_eq!(event.get_uri(true).as_deref(), Some("http://localhost/test"));
        assert_eq!(event.uri_for_path("/api/v1/test").unwrap(), "http://localhost/api/v1/test");
        assert_eq!(event.query_param("param1"), Some("value1"));
        assert_eq!(event.query_string(), Some("param1=value1&param2=value2"));
        assert!(!event.has_cookie("test-cookie").unwrap());
        assert!(event.get_cookie("test-cookie").unwrap().is_none());
    }

    #[test]
    fn host_includes_non_default_port_and_path_includes_query() {
        let event = IncomingBrowserEvent::builder()
            .url("https://example.com:8443/a/b?x=1")
            .protocol("https")
            .build()
            .unwrap();

        assert_eq!(event.host(), "example.com:8443");
        assert_eq!(event.hostname(), "example.com");
        assert_eq!(event.path(), "/a/b?x=1");
        assert_eq!(event.hash(), "");
        assert!(event.is_secure());
    }

    #[test]
    fn malformed_pathname_decodes_to_nothing() {
        let event = IncomingBrowserEvent::builder().url("http://localhost/%").build().unwrap();
        assert!(event.decoded_pathname().is_none());
        assert!(event.get_uri(false).is_none());
        assert_eq!(event.get_uri(true).as_deref(), Some("http://localhost/"));

        let event = IncomingBrowserEvent::builder().url("http://localhost/%FF").build().unwrap();
        assert!(event.decoded_pathname().is_none());

        let event = IncomingBrowserEvent::builder().url("http://localhost/caf%C3%A9").build().unwrap();
        assert_eq!(event.decoded_pathname().as_deref(), Some("/café"));
    }

    #[test]
    fn params_come_from_the_route() {
        let mut event = event();
        event.set_route_resolver(route(RouteParams::new().with_param("env", "test")));

        let params = event.params().unwrap();
        assert_eq!(params.get("env"), Some(&json!("test")));
        assert_eq!(event.get_param("env"), Some(json!("test")));
        assert!(event.route_resolver()().is_some());
    }

    #[test]
    fn get_from_route_params() {
        let mut event = event();
        event.set_route_resolver(route(RouteParams::new().with_param("name", "Stone")));
        assert_eq!(event.get("name").unwrap(), Some(json!("Stone")));
    }

    #[test]
    fn get_from_query_params() {
        let event = IncomingBrowserEvent::builder()
            .url("http://localhost/test")
            .query_string("?name=Stone.js")
            .build()
            .unwrap();
        assert_eq!(event.get("name").unwrap(), Some(json!("Stone.js")));
    }

    #[test]
    fn get_from_cookies() {
        assert_eq!(event().get_as::<String>("test").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn get_from_metadata() {
        assert_eq!(event().get("username").unwrap(), Some(json!("Jonh")));
    }

    #[test]
    fn get_falls_back() {
        let event = event();
        assert_eq!(event.get("nope").unwrap(), None);
        assert_eq!(event.get_or("nope", 5).unwrap(), json!(5));
        assert_eq!(event.get_or("username", "x").unwrap(), json!("Jonh"));
        assert_eq!(event.get_as::<u32>("nope").unwrap(), None);
        assert!(matches!(event.get_as::<u32>("username"), Err(BrowserError::Deserialize(_))));
    }

    #[test]
    fn get_skips_null_values() {
        let mut event = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .metadata_value("k", "from-metadata")
            .build()
            .unwrap();
        event.set_route_resolver(route(RouteParams::new().with_param("k", Value::Null)));

        assert_eq!(event.get("k").unwrap(), Some(json!("from-metadata")));
    }

    #[test]
    fn get_follows_precedence() {
        let build = |with_query: bool, with_cookie: bool| {
            let mut builder = IncomingBrowserEvent::builder()
                .url("http://localhost/")
                .metadata_value("env", "md");
            if with_query {
                builder = builder.query_string("env=qa");
            }
            if with_cookie {
                builder = builder.cookie_header("env=co");
            }
            builder.build().unwrap()
        };

        let mut event = build(true, true);
        event.set_route_resolver(route(RouteParams::new().with_param("env", "prod")));
        assert_eq!(event.get("env").unwrap(), Some(json!("prod")));

        assert_eq!(build(true, true).get("env").unwrap(), Some(json!("qa")));
        assert_eq!(build(false, true).get("env").unwrap(), Some(json!("co")));
        assert_eq!(build(false, false).get("env").unwrap(), Some(json!("md")));
    }

    #[test]
    fn get_cookie_falls_back_to_lower_case() {
        let event = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .cookie_header("x=1")
            .build()
            .unwrap();

        assert_eq!(event.get_cookie("X").unwrap(), event.get_cookie("x").unwrap());
        assert!(event.get_cookie("X").unwrap().is_some());
        assert!(event.has_cookie("X").unwrap());
        assert_eq!(event.get("X").unwrap(), Some(json!("1")));
    }

    #[test]
    fn get_cookie_or_fallback() {
        let event = event();
        let fallback = Cookie::create("fb", "v", CookieOptions::default()).unwrap();
        assert_eq!(event.get_cookie_or("missing", &fallback).unwrap().name(), "fb");
        assert_eq!(event.get_cookie_or("test", &fallback).unwrap().name(), "test");
    }

    #[test]
    fn blank_cookie_names_are_rejected() {
        let event = event();
        for name in ["", "   ", "\t"] {
            assert!(matches!(event.get_cookie(name), Err(BrowserError::InvalidCookieName)));
            assert!(matches!(event.has_cookie(name), Err(BrowserError::InvalidCookieName)));
        }
        assert!(matches!(event.get("  "), Err(BrowserError::InvalidCookieName)));
        assert!(matches!(event.get_or("", "x"), Err(BrowserError::InvalidCookieName)));
        assert!(matches!(event.get_as::<String>("\t"), Err(BrowserError::InvalidCookieName)));
    }

    #[test]
    fn blank_key_found_before_the_cookie_step_is_returned() {
        let event = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .query_string("%20=space")
            .build()
            .unwrap();
        assert_eq!(event.get(" ").unwrap(), Some(json!("space")));
    }

    #[test]
    fn cookies_are_parsed_from_headers() {
        let event = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .cookie_header("a=1")
            .cookie_header("b=two%20words")
            .build()
            .unwrap();

        assert_eq!(event.cookies().len(), 2);
        assert_eq!(event.get_cookie("b").unwrap().unwrap().value_str(), Some("two words"));
        assert_eq!(event.header("cookie"), Some("a=1"));
    }

    #[test]
    fn broken_structured_cookie_header_fails_construction() {
        let err = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .cookie_header("a=$$j$$:{oops")
            .build()
            .unwrap_err();
        assert!(matches!(err, BrowserError::Decode { .. }));
    }

    #[test]
    fn set_cookie_writes_through_to_document() {
        let doc = Arc::new(InMemoryCookieDocument::new());
        let cookies = CookieCollection::create(None, CookieOptions::default(), Some(doc.clone())).unwrap();
        let mut event = IncomingBrowserEvent::builder()
            .url("http://localhost/")
            .cookies(cookies)
            .build()
            .unwrap();

        event.set_cookie("theme", "dark", CookieOptions::new().with_path("/")).unwrap();
        assert_eq!(event.get("theme").unwrap(), Some(json!("dark")));
        assert_eq!(doc.cookie(), "theme=dark");
        assert!(matches!(event.set_cookie(" ", "x", CookieOptions::default()), Err(BrowserError::InvalidCookieName)));
    }

    #[test]
    fn user_resolver_is_deferred() {
        let mut event = event();
        assert!(event.get_user::<User>().is_none());

        event.set_user_resolver(|| Some(Arc::new(User { name: "Stone".into() }) as Arc<dyn Any + Send + Sync>));
        assert_eq!(event.get_user::<User>().as_deref(), Some(&User { name: "Stone".into() }));

        // Wrong type downcasts to nothing
        assert!(event.get_user::<String>().is_none());
        assert!(event.user_resolver()().is_some());
    }
}

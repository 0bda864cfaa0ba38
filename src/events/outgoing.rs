use http::header::{HeaderValue, SET_COOKIE};
use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::cookies::CookieCollection;

/// Response produced for an [`IncomingBrowserEvent`](crate::events::IncomingBrowserEvent).
#[derive(Debug, Clone, Default)]
pub struct OutgoingBrowserResponse {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub content: Option<Value>,
    pub cookies: CookieCollection,
}

impl OutgoingBrowserResponse {
    pub const EVENT_TYPE: &'static str = "outgoing_browser_response";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> OutgoingBrowserResponseBuilder {
        OutgoingBrowserResponseBuilder::default()
    }

    pub fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }

    /// Appends one `Set-Cookie` header per cookie held by the response.
    ///
    /// Cookies whose directive is not a valid header value are skipped.
    pub fn set_cookie_headers(&mut self) -> &mut Self {
        for cookie in self.cookies.iter() {
            match HeaderValue::from_str(&cookie.serialize()) {
                Ok(value) => {
                    self.headers.append(SET_COOKIE, value);
                }
                Err(e) => log::warn!("skipping Set-Cookie for {}: {e}", cookie.name()),
            }
        }
        self
    }
}

/// Builder for [`OutgoingBrowserResponse`].
#[derive(Debug, Clone, Default)]
pub struct OutgoingBrowserResponseBuilder {
    inner: OutgoingBrowserResponse,
}

impl OutgoingBrowserResponseBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut OutgoingBrowserResponse)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn status(self, status: StatusCode) -> Self { self.map(|r| r.status = Some(status)) }
    pub fn headers(self, headers: HeaderMap) -> Self { self.map(|r| r.headers = headers) }
    pub fn content<V: Into<Value>>(self, content: V) -> Self { self.map(|r| r.content = Some(content.into())) }
    pub fn cookies(self, cookies: CookieCollection) -> Self { self.map(|r| r.cookies = cookies) }

    pub fn build(self) -> OutgoingBrowserResponse {
        self.inner
    }
}

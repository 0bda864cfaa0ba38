//! Cookie attribute options.
//!
//! [`CookieOptions`] holds the attributes that travel with a cookie directive
//! (`Path`, `Expires`, `Domain`, `Max-Age`, `Secure`, `HttpOnly`, `SameSite`).
//! Every field is optional: nothing is defaulted here, and absent fields are
//! simply left out when a cookie is serialized.
//!
//! Options are plain data and can be loaded from configuration via `serde`:
//!
//! ```rust
//! use gosub_browser_event::cookies::{CookieOptions, SameSite};
//!
//! let opts: CookieOptions = serde_json::from_str(r#"{ "path": "/", "same_site": "lax" }"#).unwrap();
//! assert_eq!(opts.path.as_deref(), Some("/"));
//! assert_eq!(opts.same_site, Some(SameSite::Lax));
//! ```
//!
//! Or built fluently:
//!
//! ```rust
//! use gosub_browser_event::cookies::CookieOptions;
//!
//! let opts = CookieOptions::new().with_path("/").with_secure(true).with_max_age(3600);
//! assert_eq!(opts.max_age, Some(3600));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use time::OffsetDateTime;

/// Possible values of the `SameSite` cookie attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Lax,
    None,
    Strict,
}

impl Display for SameSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
            SameSite::Strict => write!(f, "Strict"),
        }
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
            SameSite::Strict => cookie::SameSite::Strict,
        }
    }
}

impl From<cookie::SameSite> for SameSite {
    fn from(value: cookie::SameSite) -> Self {
        match value {
            cookie::SameSite::Lax => SameSite::Lax,
            cookie::SameSite::None => SameSite::None,
            cookie::SameSite::Strict => SameSite::Strict,
        }
    }
}

/// Attributes attached to a cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Path scoping (e.g. `"/"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Absolute expiration time. Serialized as RFC 3339 in configuration.
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub expires: Option<OffsetDateTime>,

    /// Domain scoping (host-only if `None`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Relative lifetime in seconds. Zero or negative asks the store to delete the cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge: every field set on `overrides` wins, every other field is kept from `self`.
    pub fn merge(&self, overrides: &CookieOptions) -> CookieOptions {
        CookieOptions {
            path: overrides.path.clone().or_else(|| self.path.clone()),
            expires: overrides.expires.or(self.expires),
            domain: overrides.domain.clone().or_else(|| self.domain.clone()),
            max_age: overrides.max_age.or(self.max_age),
            secure: overrides.secure.or(self.secure),
            http_only: overrides.http_only.or(self.http_only),
            same_site: overrides.same_site.or(self.same_site),
        }
    }

    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

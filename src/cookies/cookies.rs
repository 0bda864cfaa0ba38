//! The [`Cookie`] value type.
//!
//! A cookie is a name, a decoded value and a set of [`CookieOptions`]. Values
//! are arbitrary JSON values; structured values (objects, arrays and `null`)
//! survive a trip through a plain-text cookie store because [`Cookie::serialize`]
//! tags them with [`STRUCTURED_VALUE_PREFIX`] and [`Cookie::create`] recognizes
//! and decodes that tag again.
//!
//! Primitive values are **not** tagged: a number or boolean that is written to
//! a store and read back comes back as a string.
//!
//! ```rust
//! use gosub_browser_event::cookies::{Cookie, CookieOptions};
//! use serde_json::json;
//!
//! let cookie = Cookie::create("prefs", json!({ "theme": "dark" }), CookieOptions::default()).unwrap();
//! let wire = cookie.serialize();
//! assert!(wire.starts_with("prefs="));
//! assert!(!wire.contains('{'));
//! ```

use crate::cookies::{grammar, CookieOptions};
use crate::errors::BrowserError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;

/// Tag marking a cookie value as JSON produced by [`Cookie::serialize`].
pub const STRUCTURED_VALUE_PREFIX: &str = "$$j$$:";

/// A single cookie.
///
/// The name cannot be changed after creation. Attributes can be adjusted in
/// place with [`set_expires`](Self::set_expires) / [`set_secure`](Self::set_secure)
/// while the cookie is being built; once a cookie is held by a
/// [`CookieCollection`](crate::cookies::CookieCollection), changes go through
/// [`clone_with`](Self::clone_with) so the collection stays the owner of record.
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    name: String,
    value: Value,
    options: CookieOptions,
}

impl Cookie {
    /// Creates a cookie, decoding `value` if it carries the structured-value prefix.
    ///
    /// Returns [`BrowserError::Decode`] when the prefixed payload is not valid JSON.
    pub fn create<N, V>(name: N, value: V, options: CookieOptions) -> Result<Self, BrowserError>
    where
        N: Into<String>,
        V: Into<Value>,
    {
        let name = name.into();
        let value = decode_value(&name, value.into())?;

        Ok(Self { name, value, options })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The value as a string slice, if it is one.
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Deserializes the decoded value into `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> Result<T, BrowserError> {
        Ok(serde_json::from_value(self.value.clone())?)
    }

    pub fn options(&self) -> &CookieOptions {
        &self.options
    }

    pub fn set_expires(&mut self, expires: OffsetDateTime) -> &mut Self {
        self.options.expires = Some(expires);
        self
    }

    pub fn set_secure(&mut self, secure: bool) -> &mut Self {
        self.options.secure = Some(secure);
        self
    }

    /// Renders the cookie as a single directive: `name=value` plus its attributes.
    pub fn serialize(&self) -> String {
        grammar::serialize(&self.name, &self.encoded_value(), &self.options)
    }

    /// Returns a new cookie with the same name, the given value and `options`
    /// merged over the current ones.
    pub fn clone_with<V: Into<Value>>(&self, value: V, options: &CookieOptions) -> Result<Cookie, BrowserError> {
        Cookie::create(self.name.clone(), value, self.options.merge(options))
    }

    /// Like [`clone_with`](Self::clone_with), but keeps the current (already decoded) value.
    pub(crate) fn with_options(&self, options: &CookieOptions) -> Cookie {
        Cookie {
            name: self.name.clone(),
            value: self.value.clone(),
            options: self.options.merge(options),
        }
    }

    /// The value in its plain-text form, before percent-encoding.
    pub(crate) fn encoded_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            // Objects, arrays and null are the structured values
            structured => format!("{STRUCTURED_VALUE_PREFIX}{structured}"),
        }
    }
}

fn decode_value(name: &str, value: Value) -> Result<Value, BrowserError> {
    match value {
        Value::String(s) => match s.strip_prefix(STRUCTURED_VALUE_PREFIX) {
            Some(payload) => serde_json::from_str(payload).map_err(|source| BrowserError::Decode {
                name: name.to_string(),
                source,
            }),
            None => Ok(Value::String(s)),
        },
        other => Ok(other),
    }
}

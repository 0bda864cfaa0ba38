use std::sync::RwLock;

use anyhow::{anyhow, Result};
use time::OffsetDateTime;

use crate::cookies::document::CookieDocument;

/// In-memory cookie document.
///
/// Behaves like a passive browser document: directives are applied as they
/// are written, `Max-Age <= 0` or an `Expires` in the past deletes the named
/// cookie, and reading returns the raw (still percent-encoded) `name=value`
/// pairs in insertion order. Every written directive is also kept in a log,
/// see [`writes`](Self::writes).
#[derive(Default)]
pub struct InMemoryCookieDocument {
    cookies: RwLock<Vec<(String, String)>>,
    writes: RwLock<Vec<String>>,
}

impl InMemoryCookieDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document that already holds the cookies in `raw` (`a=1; b=2`).
    ///
    /// A name that appears more than once keeps its first position and its last value.
    pub fn with_cookie_string(raw: &str) -> Self {
        let mut cookies = Vec::new();
        for c in cookie::Cookie::split_parse(raw).filter_map(|c| c.ok()) {
            put(&mut cookies, c.name(), c.value());
        }

        Self {
            cookies: RwLock::new(cookies),
            writes: RwLock::new(Vec::new()),
        }
    }

    /// All directives written so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes.read().map(|w| w.clone()).unwrap_or_default()
    }

    /// The most recently written directive.
    pub fn last_write(&self) -> Option<String> {
        self.writes.read().ok().and_then(|w| w.last().cloned())
    }
}

impl CookieDocument for InMemoryCookieDocument {
    fn cookie(&self) -> String {
        self.cookies
            .read()
            .map(|cookies| {
                cookies
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    fn set_cookie(&self, directive: &str) -> Result<()> {
        let parsed = cookie::Cookie::parse(directive)?;

        self.writes
            .write()
            .map_err(|_| anyhow!("cookie document write log is poisoned"))?
            .push(directive.to_string());

        let expired = parsed.max_age().is_some_and(|age| age.whole_seconds() <= 0)
            || parsed
                .expires_datetime()
                .is_some_and(|at| at <= OffsetDateTime::now_utc());

        let mut cookies = self
            .cookies
            .write()
            .map_err(|_| anyhow!("cookie document is poisoned"))?;

        if expired {
            cookies.retain(|(name, _)| name != parsed.name());
            return Ok(());
        }

        put(&mut cookies, parsed.name(), parsed.value());
        Ok(())
    }
}

fn put(cookies: &mut Vec<(String, String)>, name: &str, value: &str) {
    // Replace existing cookie with same name
    if let Some(existing) = cookies.iter_mut().find(|(n, _)| n == name) {
        existing.1 = value.to_string();
    } else {
        cookies.push((name.to_string(), value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let doc = InMemoryCookieDocument::new();
        assert_eq!(doc.cookie(), "");
        assert!(doc.writes().is_empty());
        assert!(doc.last_write().is_none());
    }

    #[test]
    fn set_and_replace_keep_position() {
        let doc = InMemoryCookieDocument::new();
        doc.set_cookie("a=1; Path=/").unwrap();
        doc.set_cookie("b=2").unwrap();
        doc.set_cookie("a=3").unwrap();

        assert_eq!(doc.cookie(), "a=3; b=2");
        assert_eq!(doc.writes(), vec!["a=1; Path=/", "b=2", "a=3"]);
        assert_eq!(doc.last_write().as_deref(), Some("a=3"));
    }

    #[test]
    fn seed_string_duplicates_collapse_to_one_entry() {
        let doc = InMemoryCookieDocument::with_cookie_string("a=1; b=2; a=3");
        assert_eq!(doc.cookie(), "a=3; b=2");
        assert!(doc.writes().is_empty());
    }

    #[test]
    fn values_stay_encoded() {
        let doc = InMemoryCookieDocument::new();
        doc.set_cookie("a=hello%20world").unwrap();
        assert_eq!(doc.cookie(), "a=hello%20world");
    }

    #[test]
    fn negative_max_age_deletes() {
        let doc = InMemoryCookieDocument::with_cookie_string("a=1; b=2");
        doc.set_cookie("a=; Max-Age=-1").unwrap();
        assert_eq!(doc.cookie(), "b=2");
    }

    #[test]
    fn past_expires_deletes() {
        let doc = InMemoryCookieDocument::with_cookie_string("a=1");
        doc.set_cookie("a=; Expires=Thu, 01 Jan 1970 00:00:00 GMT").unwrap();
        assert_eq!(doc.cookie(), "");
    }

    #[test]
    fn rejects_directive_without_name() {
        let doc = InMemoryCookieDocument::new();
        assert!(doc.set_cookie("=oops").is_err());
        assert!(doc.writes().is_empty());
    }
}

//! Cookie-string grammar.
//!
//! Thin layer over the `cookie` crate: split a `Cookie` header style string
//! (`a=1; b=2`) into decoded name/value pairs, and render one name/value plus
//! its attributes as a single percent-encoded directive.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use time::Duration;

use crate::cookies::CookieOptions;

/// Parses `name1=value1; name2=value2` into decoded pairs, in order.
///
/// Segments that cannot be parsed (no name) are skipped. Surrounding double
/// quotes are stripped from the raw value before it is percent-decoded, so an
/// encoded quote (`%22`) is kept. A value that does not decode to UTF-8 is
/// kept as written. When a name occurs more than once, only the first
/// occurrence is kept.
pub(crate) fn parse(raw: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for parsed in cookie::Cookie::split_parse(raw) {
        let c = match parsed {
            Ok(c) => c,
            Err(e) => {
                log::debug!("skipping unparsable cookie segment: {e}");
                continue;
            }
        };

        let name = decode(c.name());
        if pairs.iter().any(|(n, _)| *n == name) {
            continue;
        }

        let value = decode(unquote(c.value())).into_owned();
        pairs.push((name.into_owned(), value));
    }

    pairs
}

/// Renders `name=value` followed by every attribute present in `options`.
pub(crate) fn serialize(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut builder = cookie::Cookie::build((name.to_string(), value.to_string()));

    if let Some(path) = &options.path {
        builder = builder.path(path.clone());
    }
    if let Some(expires) = options.expires {
        builder = builder.expires(expires);
    }
    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(max_age) = options.max_age {
        builder = builder.max_age(Duration::seconds(max_age));
    }
    if let Some(secure) = options.secure {
        builder = builder.secure(secure);
    }
    if let Some(http_only) = options.http_only {
        builder = builder.http_only(http_only);
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(same_site.into());
    }

    builder.build().encoded().to_string()
}

/// Renders only the encoded `name=value` pair, without attributes.
pub(crate) fn serialize_pair(name: &str, value: &str) -> String {
    cookie::Cookie::new(name.to_string(), value.to_string()).encoded().to_string()
}

fn decode(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8().unwrap_or(Cow::Borrowed(raw))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

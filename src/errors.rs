#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("The `url` option is required")]
    MissingUrl,

    #[error("The `url` option must be a valid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Cookie name must be a non-empty string")]
    InvalidCookieName,

    #[error("Cannot decode structured value of cookie `{name}`: {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Value has an unexpected shape: {0}")]
    Deserialize(#[from] serde_json::Error),
}

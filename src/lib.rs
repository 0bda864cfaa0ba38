pub mod cookies;
pub mod events;
pub mod errors;

pub use errors::BrowserError;
pub use cookies::{Cookie, CookieCollection, CookieDocument, CookieOptions, SameSite};
pub use events::{IncomingBrowserEvent, OutgoingBrowserResponse};

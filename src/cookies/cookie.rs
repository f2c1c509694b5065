//! Cookies as a jar keeps them.
//!
//! A [`CookieJarHandle`] is shared between the page (through
//! [`JarCookieAccess`](crate::cookies::JarCookieAccess)) and whoever inspects
//! the jar. Lookups take the read lock, `Set-Cookie` handling the write lock.
//!
//! ```rust
//! use cookie_consent::cookies::Cookie;
//!
//! let c = Cookie {
//!     name: ".AspNet.CookieConsent".into(),
//!     value: "eyJBY2NlcHRlZFJldmlzaW9uIjoxfQ==".into(),
//!     path: Some("/".into()),
//!     domain: None,
//!     secure: true,
//!     expires: None,
//!     max_age: Some(15_552_000),
//!     same_site: Some("Lax".into()),
//!     http_only: false,
//! };
//! ```

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::cookies::CookieJar;

/// A handle to a cookie jar trait.
pub type CookieJarHandle = Arc<RwLock<dyn CookieJar + Send + Sync>>;

/// A cookie as kept by a [`CookieJar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Path scoping (e.g., `"/"`).
    pub path: Option<String>,

    /// Domain scoping (host-only if `None`).
    pub domain: Option<String>,

    /// If `true`, cookie is sent only over HTTPS.
    pub secure: bool,

    /// Raw `Expires` attribute, if any. Stored, not enforced.
    pub expires: Option<String>,

    /// `Max-Age` in seconds, if any. Zero or negative removes the cookie.
    pub max_age: Option<i64>,

    /// SameSite policy (`"Strict"`, `"Lax"`, or `"None"`).
    pub same_site: Option<String>,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: false,
            expires: None,
            max_age: None,
            same_site: None,
            http_only: false,
        }
    }
}

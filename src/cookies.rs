//! Cookies: the consent cookie codec, [`CookieAccess`] backends and a
//! minimal [`CookieJar`].
//!
//! The consent service never talks to a browser directly. It reads and writes
//! the consent cookie through a [`CookieAccess`] handle:
//! - [`JarCookieAccess`] backs it with a [`CookieJar`] scoped to a page URL
//!   (the browser's `document.cookie`).
//! - [`UnavailableCookieAccess`] fails every call, which is what a context
//!   sees while prerendering.
//!
//! On the server, [`RequestCookieReader`] decodes the consent cookie straight
//! from an incoming request's `Cookie` header.

mod access;
mod codec;
mod cookie;
mod cookie_jar;
mod request;
mod set_cookie;

pub use access::{CookieAccess, CookieAccessHandle, JarCookieAccess, UnavailableCookieAccess};
pub use codec::{decode_preferences, encode_preferences};
pub use cookie::{Cookie, CookieJarHandle};
pub use cookie_jar::{CookieJar, DefaultCookieJar};
pub use request::RequestCookieReader;
pub use set_cookie::set_cookie_string;

//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A **cookie jar** holds the cookies a browser keeps for a site. The consent
//! service writes the consent cookie into it with a `Set-Cookie` string and
//! reads it back by name, the way script code uses `document.cookie`.
//!
//! This module defines the [`CookieJar`] trait and a reference implementation,
//! [`DefaultCookieJar`], which stores cookies **in memory only** and parses a
//! subset of RFC 6265 `Set-Cookie` semantics.
//!
//! ## Notes & limitations
//! - Attributes handled: `Path`, `Domain`, `Expires` (stored raw), `Max-Age`,
//!   `SameSite`, `Secure`, `HttpOnly`. A `Max-Age` of zero or less removes the
//!   cookie; `Expires` is not enforced.
//! - Cookies are bucketed by **origin** (`url.origin().ascii_serialization()`).
//!   Within a bucket, simple host/subdomain and path prefix checks are applied.
//! - Not internally synchronized. Use it via a [`CookieJarHandle`](crate::cookies::CookieJarHandle).

use std::collections::HashMap;

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cookies::Cookie;

/// A cookie jar keeps the cookies of a single browsing profile.
pub trait CookieJar: Send + Sync {
    /// Stores cookies found in the `Set-Cookie` entries of `headers` for `url`.
    ///
    /// Existing cookies with the same name are replaced ("last write wins").
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap);

    /// Returns the `Cookie` request header value to send for `url`, if any.
    fn get_request_cookies(&self, url: &Url) -> Option<String>;

    /// Returns the cookie called `name` that would be sent for `url`.
    fn get_cookie(&self, url: &Url, name: &str) -> Option<Cookie>;

    /// Removes a single cookie with `cookie_name` associated with `url`.
    fn remove_cookie(&mut self, url: &Url, cookie_name: &str);

    /// Removes all cookies from the jar.
    fn clear(&mut self);
}

/// In-memory cookie jar, bucketed by origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultCookieJar {
    /// Key: origin string from `Url::origin().ascii_serialization()`.
    pub entries: HashMap<String, Vec<Cookie>>,
}

impl DefaultCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    fn matching<'a>(&'a self, url: &Url) -> impl Iterator<Item = &'a Cookie> + 'a {
        let origin = url.origin().ascii_serialization();
        let host = url.host_str().unwrap_or_default().to_string();
        let path = url.path().to_string();
        let is_https = url.scheme() == "https";

        self.entries
            .get(&origin)
            .into_iter()
            .flatten()
            .filter(move |cookie| match &cookie.domain {
                Some(domain) => host == *domain || host.ends_with(&format!(".{domain}")),
                None => true,
            })
            .filter(move |cookie| match &cookie.path {
                Some(cookie_path) => path.starts_with(cookie_path.as_str()),
                None => true,
            })
            .filter(move |cookie| !cookie.secure || is_https)
    }
}

/// Parses one `Set-Cookie` header value. Returns `None` if there is no `name=`.
fn parse_set_cookie(header: &str, default_path: &str) -> Option<Cookie> {
    let mut parts = header.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim());

    for part in parts {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            let v = v.trim();
            match k.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(v.to_string()),
                "domain" => cookie.domain = Some(v.trim_start_matches('.').to_string()),
                "expires" => cookie.expires = Some(v.to_string()),
                "max-age" => cookie.max_age = v.parse().ok(),
                "samesite" => {
                    // normalize to "Lax" | "Strict" | "None"
                    cookie.same_site = Some(if v.eq_ignore_ascii_case("lax") {
                        "Lax".to_string()
                    } else if v.eq_ignore_ascii_case("strict") {
                        "Strict".to_string()
                    } else if v.eq_ignore_ascii_case("none") {
                        "None".to_string()
                    } else {
                        v.to_string()
                    });
                }
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        } else if part.eq_ignore_ascii_case("httponly") {
            cookie.http_only = true;
        }
    }

    if cookie.path.is_none() {
        cookie.path = Some(default_path.to_string());
    }

    Some(cookie)
}

impl CookieJar for DefaultCookieJar {
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) {
        let origin = url.origin().ascii_serialization();
        let default_path = url
            .path()
            .rsplit_once('/')
            .map_or("/", |(a, _)| if a.is_empty() { "/" } else { a });

        let bucket = self.entries.entry(origin).or_default();

        for header in headers.get_all(http::header::SET_COOKIE) {
            let Ok(header_str) = header.to_str() else {
                continue;
            };
            let Some(cookie) = parse_set_cookie(header_str, default_path) else {
                continue;
            };

            if cookie.max_age.is_some_and(|age| age <= 0) {
                bucket.retain(|c| c.name != cookie.name);
                continue;
            }

            // Replace existing cookie with same name
            if let Some(existing) = bucket.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie;
            } else {
                bucket.push(cookie);
            }
        }
    }

    fn get_request_cookies(&self, url: &Url) -> Option<String> {
        let header = self
            .matching(url)
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn get_cookie(&self, url: &Url, name: &str) -> Option<Cookie> {
        self.matching(url).find(|c| c.name == name).cloned()
    }

    fn remove_cookie(&mut self, url: &Url, cookie_name: &str) {
        let origin = url.origin().ascii_serialization();
        if let Some(cookies) = self.entries.get_mut(&origin) {
            cookies.retain(|c| c.name != cookie_name);
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for v in values {
            h.append(http::header::SET_COOKIE, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn stores_and_reads_back_with_attributes() {
        let mut jar = DefaultCookieJar::new();
        let u = url("https://example.com/shop/cart");
        jar.store_response_cookies(
            &u,
            &headers(&["consent=abc==; samesite=lax; max-age=60; path=/; Secure; HttpOnly"]),
        );

        let c = jar.get_cookie(&u, "consent").unwrap();
        assert_eq!(c.value, "abc==");
        assert_eq!(c.same_site.as_deref(), Some("Lax"));
        assert_eq!(c.max_age, Some(60));
        assert_eq!(c.path.as_deref(), Some("/"));
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(jar.get_request_cookies(&u).as_deref(), Some("consent=abc=="));
    }

    #[test]
    fn default_path_is_derived_from_url() {
        let mut jar = DefaultCookieJar::new();
        let u = url("https://example.com/shop/cart");
        jar.store_response_cookies(&u, &headers(&["a=1"]));
        assert_eq!(jar.get_cookie(&u, "a").unwrap().path.as_deref(), Some("/shop"));
        assert!(jar.get_cookie(&url("https://example.com/other"), "a").is_none());
    }

    #[test]
    fn last_write_wins_and_zero_max_age_removes() {
        let mut jar = DefaultCookieJar::new();
        let u = url("https://example.com/");
        jar.store_response_cookies(&u, &headers(&["a=1; path=/", "b=2; path=/"]));
        jar.store_response_cookies(&u, &headers(&["a=3; path=/"]));
        assert_eq!(jar.get_request_cookies(&u).as_deref(), Some("a=3; b=2"));

        jar.store_response_cookies(&u, &headers(&["a=; max-age=0; path=/"]));
        assert!(jar.get_cookie(&u, "a").is_none());
        assert_eq!(jar.get_request_cookies(&u).as_deref(), Some("b=2"));
    }

    #[test]
    fn secure_cookies_are_not_sent_over_http() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        jar.store_response_cookies(&u, &headers(&["s=1; Secure; path=/"]));
        assert!(jar.get_cookie(&u, "s").is_none());
        assert!(jar.get_request_cookies(&u).is_none());
    }

    #[test]
    fn empty_value_keeps_following_attributes() {
        let mut jar = DefaultCookieJar::new();
        let u = url("https://example.com/");
        jar.store_response_cookies(&u, &headers(&["e=; path=/; samesite=strict"]));
        let c = jar.get_cookie(&u, "e").unwrap();
        assert_eq!(c.value, "");
        assert_eq!(c.same_site.as_deref(), Some("Strict"));
    }

    #[test]
    fn remove_and_clear() {
        let mut jar = DefaultCookieJar::new();
        let u = url("https://example.com/");
        jar.store_response_cookies(&u, &headers(&["a=1; path=/", "b=2; path=/"]));
        jar.remove_cookie(&u, "a");
        assert_eq!(jar.get_request_cookies(&u).as_deref(), Some("b=2"));
        jar.clear();
        assert!(jar.get_request_cookies(&u).is_none());
    }
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::cookies::CookieJarHandle;

/// Read/write primitives for the consent cookie, as exposed by a browser.
///
/// Implementations must be `Send + Sync`; callers only hold `&self`.
pub trait CookieAccess: Send + Sync {
    /// Returns the raw value of the cookie called `name`, or `None` if it is not set.
    fn read_cookie(&self, name: &str) -> Result<Option<String>>;

    /// Applies a full `Set-Cookie` string (`name=value; attr; ...`).
    fn write_cookie(&self, set_cookie: &str) -> Result<()>;
}

/// A handle to a cookie access trait.
pub type CookieAccessHandle = Arc<dyn CookieAccess>;

/// Cookie access backed by a [`CookieJar`](crate::cookies::CookieJar) for a
/// single page URL, the way `document.cookie` is scoped to the current page.
pub struct JarCookieAccess {
    jar: CookieJarHandle,
    url: Url,
}

impl JarCookieAccess {
    pub fn new(jar: CookieJarHandle, url: Url) -> Self {
        Self { jar, url }
    }
}

impl CookieAccess for JarCookieAccess {
    fn read_cookie(&self, name: &str) -> Result<Option<String>> {
        let jar = self
            .jar
            .read()
            .map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        Ok(jar.get_cookie(&self.url, name).map(|c| c.value))
    }

    fn write_cookie(&self, set_cookie: &str) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::SET_COOKIE, HeaderValue::from_str(set_cookie)?);

        let mut jar = self
            .jar
            .write()
            .map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        jar.store_response_cookies(&self.url, &headers);
        Ok(())
    }
}

/// Cookie access for contexts without a browser (e.g. prerendering).
/// Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCookieAccess;

impl CookieAccess for UnavailableCookieAccess {
    fn read_cookie(&self, _name: &str) -> Result<Option<String>> {
        Err(anyhow!("cookie access is not available in this context"))
    }

    fn write_cookie(&self, _set_cookie: &str) -> Result<()> {
        Err(anyhow!("cookie access is not available in this context"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::DefaultCookieJar;
    use std::sync::RwLock;

    fn access() -> (CookieJarHandle, JarCookieAccess) {
        let jar: CookieJarHandle = Arc::new(RwLock::new(DefaultCookieJar::new()));
        let access = JarCookieAccess::new(jar.clone(), Url::parse("https://example.com/page").unwrap());
        (jar, access)
    }

    #[test]
    fn write_then_read_through_jar() {
        let (jar, access) = access();
        assert_eq!(access.read_cookie("consent").unwrap(), None);

        access.write_cookie("consent=xyz; path=/; Secure").unwrap();
        assert_eq!(access.read_cookie("consent").unwrap().as_deref(), Some("xyz"));

        // Visible to anyone holding the same jar
        let url = Url::parse("https://example.com/other").unwrap();
        assert_eq!(
            jar.read().unwrap().get_request_cookies(&url).as_deref(),
            Some("consent=xyz")
        );
    }

    #[test]
    fn invalid_header_value_is_an_error() {
        let (_jar, access) = access();
        assert!(access.write_cookie("consent=a\nb").is_err());
    }

    #[test]
    fn unavailable_access_always_fails() {
        let access = UnavailableCookieAccess;
        assert!(access.read_cookie("consent").is_err());
        assert!(access.write_cookie("consent=1").is_err());
    }
}

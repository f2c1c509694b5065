use http::HeaderMap;

use crate::config::DEFAULT_COOKIE_NAME;
use crate::cookies::decode_preferences;
use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;

/// Reads consent preferences from an incoming HTTP request on the server,
/// without going through the browser.
#[derive(Debug, Clone)]
pub struct RequestCookieReader {
    cookie_name: String,
}

impl Default for RequestCookieReader {
    fn default() -> Self {
        Self::new(DEFAULT_COOKIE_NAME)
    }
}

impl RequestCookieReader {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    /// Raw value of the consent cookie in the request's `Cookie` headers.
    pub fn raw_value<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.trim() == self.cookie_name)
            .map(|(_, value)| value.trim())
    }

    /// Returns the preferences stored in the request.
    ///
    /// A missing or empty cookie yields default (empty, revision 0) preferences.
    /// A cookie that cannot be decoded is an error.
    pub fn preferences(&self, headers: &HeaderMap) -> Result<CookiePreferences, ConsentError> {
        match self.raw_value(headers) {
            Some(value) if !value.is_empty() => decode_preferences(value),
            _ => Ok(CookiePreferences::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::encode_preferences;
    use http::HeaderValue;

    fn request(cookie: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(http::header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        h
    }

    #[test]
    fn finds_consent_cookie_among_others() {
        let mut prefs = CookiePreferences::with_revision(2);
        prefs.allowed_categories.insert("necessary".into());
        let value = encode_preferences(&prefs, true).unwrap();

        let headers = request(&format!("session=1; .AspNet.CookieConsent={value}; theme=dark"));
        let reader = RequestCookieReader::default();
        assert_eq!(reader.raw_value(&headers), Some(value.as_str()));
        assert_eq!(reader.preferences(&headers).unwrap(), prefs);
    }

    #[test]
    fn missing_cookie_yields_default() {
        let reader = RequestCookieReader::new("consent");
        assert_eq!(reader.preferences(&HeaderMap::new()).unwrap(), CookiePreferences::default());
        assert_eq!(reader.preferences(&request("other=1")).unwrap(), CookiePreferences::default());
        assert_eq!(reader.preferences(&request("consent=")).unwrap(), CookiePreferences::default());
    }

    #[test]
    fn undecodable_cookie_is_an_error() {
        let reader = RequestCookieReader::new("consent");
        assert!(reader.preferences(&request("consent=%%%")).is_err());
    }
}

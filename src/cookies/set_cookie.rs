use time::macros::format_description;
use time::UtcOffset;

use crate::config::CookieOptions;

/// Builds the `Set-Cookie` string for the consent cookie.
///
/// Attribute order: `samesite`, `max-age`, `domain`, `path`, `HttpOnly`,
/// `Secure`, `expires`. Optional attributes are omitted when unset.
pub fn set_cookie_string(options: &CookieOptions, value: &str) -> String {
    let mut s = format!("{}={}; samesite={}", options.name, value, options.same_site);

    if let Some(max_age) = options.max_age_secs {
        s.push_str(&format!("; max-age={max_age}"));
    }
    if let Some(domain) = options.domain.as_deref().filter(|d| !d.is_empty()) {
        s.push_str(&format!("; domain={domain}"));
    }
    if let Some(path) = options.path.as_deref().filter(|p| !p.is_empty()) {
        s.push_str(&format!("; path={path}"));
    }
    if options.http_only {
        s.push_str("; HttpOnly");
    }
    if options.secure {
        s.push_str("; Secure");
    }
    if let Some(expires) = options.expires {
        // RFC 1123, always in GMT
        let fmt = format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        );
        match expires.to_offset(UtcOffset::UTC).format(&fmt) {
            Ok(date) => s.push_str(&format!("; expires={date}")),
            Err(e) => log::warn!("cookie expiry {expires} could not be formatted: {e}"),
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSite;
    use time::macros::datetime;

    #[test]
    fn default_options() {
        let s = set_cookie_string(&CookieOptions::default(), "abc");
        assert_eq!(
            s,
            ".AspNet.CookieConsent=abc; samesite=Lax; max-age=15552000; path=/; Secure"
        );
    }

    #[test]
    fn all_attributes() {
        let options = CookieOptions {
            name: "consent".into(),
            domain: Some("example.com".into()),
            path: Some("/app".into()),
            same_site: SameSite::Strict,
            secure: true,
            http_only: true,
            max_age_secs: Some(60),
            expires: Some(datetime!(1994-11-06 09:49:37 +1)),
            encode_base64: false,
        };
        assert_eq!(
            set_cookie_string(&options, "v"),
            "consent=v; samesite=Strict; max-age=60; domain=example.com; path=/app; HttpOnly; Secure; expires=Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn unset_attributes_are_omitted() {
        let options = CookieOptions {
            path: None,
            domain: Some(String::new()),
            secure: false,
            max_age_secs: None,
            ..CookieOptions::default()
        };
        assert_eq!(
            set_cookie_string(&options, "v"),
            ".AspNet.CookieConsent=v; samesite=Lax"
        );
    }
}

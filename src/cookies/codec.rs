use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::ConsentError;
use crate::preferences::CookiePreferences;

/// Serializes preferences into a cookie value: JSON, optionally base64-encoded.
pub fn encode_preferences(
    preferences: &CookiePreferences,
    base64: bool,
) -> Result<String, ConsentError> {
    let json = serde_json::to_string(preferences)?;
    Ok(if base64 { BASE64.encode(json) } else { json })
}

/// Decodes a cookie value. Raw JSON (starting with `{`) and base64-encoded
/// JSON are both accepted.
pub fn decode_preferences(value: &str) -> Result<CookiePreferences, ConsentError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConsentError::CookieDecode("empty cookie value".into()));
    }

    if value.starts_with('{') {
        return Ok(serde_json::from_str(value)?);
    }

    let bytes = BASE64
        .decode(value)
        .map_err(|e| ConsentError::CookieDecode(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

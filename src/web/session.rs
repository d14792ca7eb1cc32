//! Signed cookie sessions
//!
//! The whole session lives in the cookie: JSON, base64url encoded, followed by
//! a `.` and an HMAC-SHA256 signature of the encoded payload. A cookie whose
//! signature does not verify is treated as an empty session.

use axum::http::{header, HeaderMap};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Bootstrap-style category: `success`, `danger`, `info`
    pub kind: String,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            kind: "danger".to_string(),
            message: message.into(),
        }
    }
}

/// Per-visitor state carried between requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flash: Vec<Flash>,
    /// Anti-forgery value for an in-flight provider login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_state: Option<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self == &Session::default()
    }

    pub fn clear(&mut self) {
        *self = Session::default();
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid session key")]
pub struct InvalidKey;

/// Encodes, signs and verifies session cookies
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    cookie_name: String,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: &[u8], cookie_name: impl Into<String>, secure: bool) -> Result<Self, InvalidKey> {
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| InvalidKey)?;
        Ok(Self {
            mac,
            cookie_name: cookie_name.into(),
            secure,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        BASE64URL_NOPAD.encode(&mac.finalize().into_bytes())
    }

    /// Cookie value for `session`
    pub fn encode(&self, session: &Session) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(session)?;
        let payload = BASE64URL_NOPAD.encode(&json);
        let signature = self.sign(&payload);
        Ok(format!("{}.{}", payload, signature))
    }

    /// Verify and decode a cookie value. Returns `None` for anything tampered
    /// with or malformed.
    pub fn decode(&self, value: &str) -> Option<Session> {
        let (payload, signature) = value.split_once('.')?;
        let signature = BASE64URL_NOPAD.decode(signature.as_bytes()).ok()?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            tracing::debug!("Rejected session cookie with bad signature");
            return None;
        }

        let json = BASE64URL_NOPAD.decode(payload.as_bytes()).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Read the session out of the request's `Cookie` headers
    pub fn from_headers(&self, headers: &HeaderMap) -> Session {
        let prefix = format!("{}=", self.cookie_name);
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
            .and_then(|value| self.decode(value))
            .unwrap_or_default()
    }

    /// `Set-Cookie` value storing `session`, or expiring the cookie when the
    /// session is empty
    pub fn set_cookie(&self, session: &Session) -> Result<String, serde_json::Error> {
        let secure = if self.secure { "; Secure" } else { "" };
        if session.is_empty() {
            return Ok(format!(
                "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
                self.cookie_name, secure
            ));
        }
        Ok(format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax{}",
            self.cookie_name,
            self.encode(session)?,
            secure
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn codec() -> SessionCodec {
        SessionCodec::new(b"test-secret", "_quillpad_session", false).unwrap()
    }

    fn session() -> Session {
        Session {
            user_id: Some(7),
            flash: vec![Flash::success("Saved")],
            oauth_state: None,
        }
    }

    #[test]
    fn test_encode_decode() {
        let codec = codec();
        let value = codec.encode(&session()).unwrap();
        assert_eq!(codec.decode(&value), Some(session()));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let value = codec.encode(&session()).unwrap();
        let (_, signature) = value.split_once('.').unwrap();

        let forged = Session {
            user_id: Some(1),
            ..Session::default()
        };
        let forged_payload = BASE64URL_NOPAD.encode(&serde_json::to_vec(&forged).unwrap());
        assert!(codec.decode(&format!("{}.{}", forged_payload, signature)).is_none());
    }

    #[test]
    fn test_other_key_rejected() {
        let value = codec().encode(&session()).unwrap();
        let other = SessionCodec::new(b"another-secret", "_quillpad_session", false).unwrap();
        assert!(other.decode(&value).is_none());
        assert!(other.decode("garbage").is_none());
    }

    #[test]
    fn test_from_headers() {
        let codec = codec();
        let value = codec.encode(&session()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; _quillpad_session={}", value)).unwrap(),
        );

        assert_eq!(codec.from_headers(&headers), session());
        assert!(codec.from_headers(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_set_cookie() {
        let codec = codec();
        let cookie = codec.set_cookie(&session()).unwrap();
        assert!(cookie.starts_with("_quillpad_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));

        let cleared = codec.set_cookie(&Session::default()).unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let secure = SessionCodec::new(b"k", "s", true).unwrap();
        assert!(secure.set_cookie(&session()).unwrap().ends_with("; Secure"));
    }
}

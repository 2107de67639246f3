use axum::http::{header, HeaderMap, HeaderValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::sessions::SESSION_TTL;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "jobfinder.sid";

/// Signs session ids into cookie values and reads them back.
///
/// Cookie value format: `<session id>.<hex hmac-sha256 of the id>`.
/// A value whose signature does not check out is treated as no cookie at all.
#[derive(Clone)]
pub struct SessionCookies {
    secret: Vec<u8>,
    secure: bool,
}

impl SessionCookies {
    pub fn new(secret: &str, secure: bool) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            secure,
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length")
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        format!(
            "{session_id}.{}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    /// Returns the session id if `value` carries a valid signature.
    pub fn unsign(&self, value: &str) -> Option<String> {
        let (session_id, sig) = value.rsplit_once('.')?;
        if session_id.is_empty() {
            return None;
        }
        let expected = hex::decode(sig).ok()?;
        let mut mac = self.mac();
        mac.update(session_id.as_bytes());
        mac.verify_slice(&expected).ok()?;
        Some(session_id.to_string())
    }

    /// Finds and verifies the session cookie among the request's `Cookie` headers.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == SESSION_COOKIE)
            .find_map(|(_, value)| self.unsign(value))
    }

    /// `Set-Cookie` value binding the browser to `session_id`.
    pub fn set_cookie(&self, session_id: &str) -> HeaderValue {
        self.render(&self.sign(session_id), SESSION_TTL.as_secs())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> HeaderValue {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> HeaderValue {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        // Session ids are hex and signatures are hex, so the value is always visible ASCII.
        HeaderValue::from_str(&cookie).expect("cookie header is ASCII")
    }
}

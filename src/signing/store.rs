//! Browser-side token storage
//!
//! The nonce and the session ID survive the redirect round trip in two
//! cookies. No server-side state is kept. The reconciler only sees the
//! narrow [`TokenStore`] capability so it can run against an in-memory fake.

use std::collections::HashMap;

use hyper::header::{HeaderMap, COOKIE};

/// The two persisted values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    Nonce,
    SessionId,
}

impl TokenSlot {
    pub const ALL: [TokenSlot; 2] = [TokenSlot::Nonce, TokenSlot::SessionId];

    /// Cookie name for this slot
    pub fn cookie_name(self) -> &'static str {
        match self {
            TokenSlot::Nonce => "nonce",
            TokenSlot::SessionId => "session_id",
        }
    }
}

/// Key-value capability over the two slots
pub trait TokenStore: Send + Sync {
    fn get(&self, slot: TokenSlot) -> Option<String>;
    fn set(&mut self, slot: TokenSlot, value: String);
    fn clear(&mut self, slot: TokenSlot);
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    values: HashMap<TokenSlot, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: TokenSlot, value: impl Into<String>) -> Self {
        self.values.insert(slot, value.into());
        self
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        self.values.get(&slot).cloned()
    }

    fn set(&mut self, slot: TokenSlot, value: String) {
        self.values.insert(slot, value);
    }

    fn clear(&mut self, slot: TokenSlot) {
        self.values.remove(&slot);
    }
}

/// Cookie-backed store for one HTTP exchange
///
/// Reads come from the request `Cookie` header. Writes are queued and
/// turned into `Set-Cookie` header values for the response.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    incoming: HashMap<String, String>,
    pending: Vec<(TokenSlot, Option<String>)>,
    secure: bool,
}

impl CookieJar {
    /// Parse the cookies of an incoming request
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let mut incoming = HashMap::new();

        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                let Some((name, value)) = pair.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                let value = value.trim().trim_matches('"');
                if name.is_empty() || incoming.contains_key(name) {
                    continue;
                }
                let decoded = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                incoming.insert(name.to_string(), decoded);
            }
        }

        Self {
            incoming,
            pending: Vec::new(),
            secure,
        }
    }

    /// `Set-Cookie` values for every queued write, in write order
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.pending
            .iter()
            .map(|(slot, value)| self.render(*slot, value.as_deref()))
            .collect()
    }

    fn render(&self, slot: TokenSlot, value: Option<&str>) -> String {
        let mut cookie = match value {
            Some(value) => format!("{}={}", slot.cookie_name(), urlencoding::encode(value)),
            None => format!("{}=; Max-Age=0", slot.cookie_name()),
        };
        cookie.push_str("; Path=/; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

impl TokenStore for CookieJar {
    fn get(&self, slot: TokenSlot) -> Option<String> {
        // Latest queued write wins over what the browser sent
        if let Some((_, value)) = self.pending.iter().rev().find(|(s, _)| *s == slot) {
            return value.clone();
        }
        self.incoming
            .get(slot.cookie_name())
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn set(&mut self, slot: TokenSlot, value: String) {
        self.pending.push((slot, Some(value)));
    }

    fn clear(&mut self, slot: TokenSlot) {
        self.pending.push((slot, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_parse_cookie_header() {
        let jar = CookieJar::from_headers(&headers("theme=dark; nonce=abc123; session_id=sess%2F1"), false);
        assert_eq!(jar.get(TokenSlot::Nonce).as_deref(), Some("abc123"));
        assert_eq!(jar.get(TokenSlot::SessionId).as_deref(), Some("sess/1"));
    }

    #[test]
    fn test_missing_and_empty_cookies() {
        let jar = CookieJar::from_headers(&headers("nonce="), false);
        assert_eq!(jar.get(TokenSlot::Nonce), None);
        assert_eq!(jar.get(TokenSlot::SessionId), None);

        let jar = CookieJar::from_headers(&HeaderMap::new(), false);
        assert_eq!(jar.get(TokenSlot::Nonce), None);
    }

    #[test]
    fn test_set_and_clear_render_headers() {
        let mut jar = CookieJar::from_headers(&HeaderMap::new(), true);
        jar.set(TokenSlot::Nonce, "n1".to_string());
        jar.set(TokenSlot::SessionId, "s 1".to_string());
        assert_eq!(jar.get(TokenSlot::SessionId).as_deref(), Some("s 1"));

        let rendered = jar.set_cookie_headers();
        assert_eq!(rendered[0], "nonce=n1; Path=/; HttpOnly; SameSite=Lax; Secure");
        assert_eq!(rendered[1], "session_id=s%201; Path=/; HttpOnly; SameSite=Lax; Secure");

        jar.clear(TokenSlot::Nonce);
        assert_eq!(jar.get(TokenSlot::Nonce), None);
        assert_eq!(
            jar.set_cookie_headers()[2],
            "nonce=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryTokenStore::new().with(TokenSlot::Nonce, "n");
        assert_eq!(store.get(TokenSlot::Nonce).as_deref(), Some("n"));
        store.clear(TokenSlot::Nonce);
        assert_eq!(store.get(TokenSlot::Nonce), None);
    }
}

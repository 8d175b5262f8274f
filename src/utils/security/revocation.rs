use chrono::Utc;
use dashmap::DashMap;

/// Logged-out tokens, kept until they would have expired anyway.
///
/// Process-local: the list is lost on restart and not shared between instances.
#[derive(Debug, Default)]
pub struct TokenBlacklist {
    tokens: DashMap<String, u64>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// `expires_at` is the token's `exp` claim (unix seconds).
    pub fn revoke(&self, token: &str, expires_at: u64) {
        self.purge_expired();
        self.tokens.insert(token.to_string(), expires_at);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn purge_expired(&self) {
        let now = Utc::now().timestamp().max(0) as u64;
        self.tokens.retain(|_, expires_at| *expires_at > now);
    }
}

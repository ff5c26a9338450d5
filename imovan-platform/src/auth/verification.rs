//! Verification code store
//!
//! Short-lived email confirmation codes, held in an explicitly scoped store
//! owned by the component that issues them. The store has a defined
//! lifetime; nothing here is process-global.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// A pending confirmation code for one email address
#[derive(Debug, Clone)]
struct VerificationCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Scoped store of pending verification codes, keyed by email
#[derive(Debug)]
pub struct VerificationCodeStore {
    codes: RwLock<HashMap<String, VerificationCode>>,
    ttl: Duration,
}

impl VerificationCodeStore {
    /// Create a store whose codes expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a fresh 6-digit code for the address, replacing any pending one
    pub fn issue(&self, email: &str) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let entry = VerificationCode {
            code: code.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        let mut codes = self.codes.write().unwrap();
        codes.insert(email.to_lowercase(), entry);

        debug!("Issued verification code for {}", email);
        code
    }

    /// Check a submitted code; a matching, unexpired code is consumed
    pub fn verify(&self, email: &str, submitted: &str) -> bool {
        let key = email.to_lowercase();
        let mut codes = self.codes.write().unwrap();

        let Some(entry) = codes.get(&key) else {
            return false;
        };

        if entry.expires_at <= Utc::now() {
            codes.remove(&key);
            return false;
        }

        if entry.code != submitted {
            return false;
        }

        codes.remove(&key);
        true
    }

    /// Look up the pending code without consuming it (development mode
    /// surfaces it in logs instead of sending email)
    pub fn pending(&self, email: &str) -> Option<String> {
        let codes = self.codes.read().unwrap();
        codes
            .get(&email.to_lowercase())
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.code.clone())
    }

    /// Drop expired codes, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut codes = self.codes.write().unwrap();
        let before = codes.len();
        codes.retain(|_, entry| entry.expires_at > now);
        before - codes.len()
    }
}

impl Default for VerificationCodeStore {
    fn default() -> Self {
        Self::new(Duration::minutes(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_verifies_once() {
        let store = VerificationCodeStore::default();
        let code = store.issue("user@example.com");

        assert!(store.verify("user@example.com", &code));
        // consumed on success
        assert!(!store.verify("user@example.com", &code));
    }

    #[test]
    fn verification_is_case_insensitive_on_email() {
        let store = VerificationCodeStore::default();
        let code = store.issue("User@Example.com");
        assert!(store.verify("user@example.com", &code));
    }

    #[test]
    fn wrong_code_is_rejected_and_not_consumed() {
        let store = VerificationCodeStore::default();
        let code = store.issue("user@example.com");

        assert!(!store.verify("user@example.com", "000000"));
        assert!(store.verify("user@example.com", &code));
    }

    #[test]
    fn expired_codes_are_rejected_and_purged() {
        let store = VerificationCodeStore::new(Duration::minutes(-1));
        let code = store.issue("user@example.com");

        assert!(!store.verify("user@example.com", &code));
        store.issue("other@example.com");
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn reissuing_replaces_the_pending_code() {
        let store = VerificationCodeStore::default();
        let first = store.issue("user@example.com");
        let second = store.issue("user@example.com");

        if first != second {
            assert!(!store.verify("user@example.com", &first));
        }
        assert!(store.verify("user@example.com", &second));
    }
}

//! crates/dealership_core/src/session.rs
//!
//! Session validation and revocation.
//!
//! A token is only honoured while the session cache holds it under the digest
//! of its owner's email. Deleting that entry (logout, password change, account
//! deletion) or overwriting it (a newer login) revokes the token immediately,
//! even though its signature stays verifiable until it expires.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::domain::{Subject, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::{SessionCache, TokenService};

/// Cache key for the account identified by `email`.
pub fn cache_key(email: &str) -> String {
    format!("jwt:{:x}", Sha256::digest(email.as_bytes()))
}

/// Outcome of [`validate_session`]. Carries no reason for rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Valid(Subject),
    Invalid,
}

impl SessionCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionCheck::Valid(_))
    }

    pub fn subject(&self) -> Option<&Subject> {
        match self {
            SessionCheck::Valid(subject) => Some(subject),
            SessionCheck::Invalid => None,
        }
    }

    pub fn into_subject(self) -> CoreResult<Subject> {
        match self {
            SessionCheck::Valid(subject) => Ok(subject),
            SessionCheck::Invalid => Err(CoreError::InvalidSession),
        }
    }
}

/// Verifies the token, then requires the cache to still hold exactly this
/// token for its owner. Every failure collapses to [`SessionCheck::Invalid`].
pub async fn validate_session(
    tokens: &dyn TokenService,
    cache: &dyn SessionCache,
    token: Option<&str>,
) -> SessionCheck {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return SessionCheck::Invalid;
    };

    let subject = match tokens.verify(token) {
        Ok(subject) => subject,
        Err(e) => {
            debug!("Rejected session token: {}", e);
            return SessionCheck::Invalid;
        }
    };

    match cache.get(&cache_key(&subject.email)).await {
        Some(active) if active == token => SessionCheck::Valid(subject),
        Some(_) => {
            debug!(user_id = %subject.id, "token superseded by a newer login");
            SessionCheck::Invalid
        }
        None => {
            debug!(user_id = %subject.id, "no live session for token owner");
            SessionCheck::Invalid
        }
    }
}

/// Issues, checks and revokes sessions against one token service and cache.
#[derive(Clone)]
pub struct SessionManager {
    tokens: Arc<dyn TokenService>,
    cache: Arc<dyn SessionCache>,
}

impl SessionManager {
    pub fn new(tokens: Arc<dyn TokenService>, cache: Arc<dyn SessionCache>) -> Self {
        Self { tokens, cache }
    }

    pub async fn validate(&self, token: Option<&str>) -> SessionCheck {
        validate_session(self.tokens.as_ref(), self.cache.as_ref(), token).await
    }

    /// Signs a token for `user` and makes it the account's only live session.
    /// A refused cache write means no session exists, so no token is returned.
    pub async fn establish(&self, user: &User) -> CoreResult<String> {
        let token = self.tokens.sign(&Subject::from(user))?;
        if !self.cache.set(&cache_key(&user.email), token.clone()).await {
            warn!(user_id = %user.id, "Failed to cache session token");
            return Err(CoreError::SessionNotEstablished);
        }
        info!(user_id = %user.id, role = %user.role, "session established");
        Ok(token)
    }

    /// Drops the live session for `email`, if any. Returns the number removed.
    pub async fn revoke(&self, email: &str) -> usize {
        let removed = self.cache.delete(&cache_key(email)).await;
        if removed > 0 {
            info!("session revoked");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Tokens of the form `<serial>|<id>|<email>|<role>`; anything else fails to verify.
    #[derive(Default)]
    struct FakeTokens {
        serial: AtomicU64,
    }

    impl TokenService for FakeTokens {
        fn sign(&self, subject: &Subject) -> PortResult<String> {
            let n = self.serial.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{n}|{}|{}|{}", subject.id, subject.email, subject.role))
        }

        fn verify(&self, token: &str) -> PortResult<Subject> {
            let parts: Vec<&str> = token.split('|').collect();
            let [_, id, email, role] = parts.as_slice() else {
                return Err(PortError::Unauthorized);
            };
            Ok(Subject {
                id: id.parse().map_err(|_| PortError::Unauthorized)?,
                email: email.to_string(),
                role: role.parse().map_err(|_| PortError::Unauthorized)?,
            })
        }
    }

    #[derive(Default)]
    struct FakeCache {
        entries: Mutex<HashMap<String, String>>,
        refuse_writes: bool,
    }

    #[async_trait]
    impl SessionCache for FakeCache {
        async fn set(&self, key: &str, value: String) -> bool {
            if self.refuse_writes {
                return false;
            }
            self.entries.lock().unwrap().insert(key.to_string(), value);
            true
        }

        async fn get(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        async fn has(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        async fn delete(&self, key: &str) -> usize {
            usize::from(self.entries.lock().unwrap().remove(key).is_some())
        }
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "digest".into(),
            role,
            created_at: Utc::now(),
        }
    }

    fn manager(cache: Arc<FakeCache>) -> SessionManager {
        SessionManager::new(Arc::new(FakeTokens::default()), cache)
    }

    #[test]
    fn cache_key_is_a_stable_digest() {
        let key = cache_key("ada@example.com");
        assert!(key.starts_with("jwt:"));
        assert_eq!(key.len(), 4 + 64);
        assert_eq!(key, cache_key("ada@example.com"));
        assert_ne!(key, cache_key("bob@example.com"));
    }

    #[tokio::test]
    async fn established_session_validates() {
        let sessions = manager(Arc::new(FakeCache::default()));
        let account = user(Role::Staff);

        let token = sessions.establish(&account).await.unwrap();
        let check = sessions.validate(Some(&token)).await;

        assert_eq!(
            check.subject().map(|s| (s.id, s.role)),
            Some((account.id, Role::Staff))
        );
    }

    #[tokio::test]
    async fn missing_or_malformed_tokens_are_invalid() {
        let sessions = manager(Arc::new(FakeCache::default()));
        assert_eq!(sessions.validate(None).await, SessionCheck::Invalid);
        assert_eq!(sessions.validate(Some("   ")).await, SessionCheck::Invalid);
        assert_eq!(sessions.validate(Some("garbage")).await, SessionCheck::Invalid);
    }

    #[tokio::test]
    async fn revocation_invalidates_a_still_verifiable_token() {
        let cache = Arc::new(FakeCache::default());
        let tokens = FakeTokens::default();
        let sessions = SessionManager::new(Arc::new(FakeTokens::default()), cache.clone());
        let account = user(Role::User);

        let token = sessions.establish(&account).await.unwrap();
        assert!(sessions.validate(Some(&token)).await.is_valid());

        assert_eq!(sessions.revoke(&account.email).await, 1);
        assert!(tokens.verify(&token).is_ok());
        assert!(!cache.has(&cache_key(&account.email)).await);
        assert_eq!(sessions.validate(Some(&token)).await, SessionCheck::Invalid);
        assert_eq!(sessions.revoke(&account.email).await, 0);
    }

    #[tokio::test]
    async fn relogin_supersedes_the_previous_token() {
        let sessions = manager(Arc::new(FakeCache::default()));
        let account = user(Role::User);

        let first = sessions.establish(&account).await.unwrap();
        let second = sessions.establish(&account).await.unwrap();

        assert_ne!(first, second);
        assert!(!sessions.validate(Some(&first)).await.is_valid());
        assert!(sessions.validate(Some(&second)).await.is_valid());
    }

    #[tokio::test]
    async fn refused_cache_write_means_no_session() {
        let cache = Arc::new(FakeCache {
            refuse_writes: true,
            ..FakeCache::default()
        });
        let sessions = manager(cache);

        let result = sessions.establish(&user(Role::Admin)).await;
        assert!(matches!(result, Err(CoreError::SessionNotEstablished)));
    }

    #[test]
    fn invalid_check_maps_to_invalid_session_error() {
        assert!(matches!(
            SessionCheck::Invalid.into_subject(),
            Err(CoreError::InvalidSession)
        ));
    }
}

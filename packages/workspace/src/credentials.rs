//! Bearer credentials for service calls.
//!
//! The token comes from an external session store; nothing here logs in
//! or refreshes it.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn token(&self) -> GatewayResult<String>;
}

/// Token read from an environment variable on every request
#[derive(Debug, Clone)]
pub struct EnvSessionStore {
    var: String,
}

impl EnvSessionStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

#[async_trait]
impl SessionStore for EnvSessionStore {
    async fn token(&self) -> GatewayResult<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(GatewayError::MissingCredential(self.var.clone())),
        }
    }
}

/// Fixed token, for hosts that already hold one
#[derive(Clone)]
pub struct StaticSessionStore(String);

impl StaticSessionStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticSessionStore(..)")
    }
}

#[async_trait]
impl SessionStore for StaticSessionStore {
    async fn token(&self) -> GatewayResult<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_env_token_names_the_variable() {
        let store = EnvSessionStore::new("LIVECANVAS_TEST_TOKEN_THAT_IS_NEVER_SET");
        match store.token().await {
            Err(GatewayError::MissingCredential(var)) => {
                assert_eq!(var, "LIVECANVAS_TEST_TOKEN_THAT_IS_NEVER_SET")
            }
            other => panic!("expected missing credential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_token_is_not_printed() {
        let store = StaticSessionStore::new("secret");
        assert_eq!(store.token().await.unwrap(), "secret");
        assert!(!format!("{:?}", store).contains("secret"));
    }
}

//! Token table configured at startup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{AuthError, Principal, PrincipalResolver};

/// Resolves bearer tokens from a fixed table
#[derive(Debug, Clone, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token that grants the admin capability
    pub fn with_admin(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), Principal::admin(user_id));
        self
    }

    /// Register a token for an identified viewer
    pub fn with_viewer(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), Principal::viewer(user_id));
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl PrincipalResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_known_and_unknown_tokens() {
        // テスト項目: 登録済みトークンは対応する Principal に解決され、未知のトークンは拒否される
        // given (前提条件):
        let resolver = StaticTokenResolver::new()
            .with_admin("admin-secret", "lecturer")
            .with_viewer("viewer-secret", "student");

        // when (操作):
        let admin = resolver.resolve("admin-secret").await;
        let viewer = resolver.resolve("viewer-secret").await;
        let unknown = resolver.resolve("nope").await;

        // then (期待する結果):
        assert_eq!(admin, Ok(Principal::admin("lecturer")));
        assert!(!viewer.unwrap().is_admin);
        assert_eq!(unknown, Err(AuthError::Unauthenticated));
    }
}

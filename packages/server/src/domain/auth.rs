//! Bearer token resolution.

use async_trait::async_trait;

use super::{AuthError, Principal};

/// Verifies a bearer token and returns the principal it belongs to
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Principal, AuthError>;
}

//! Service traits the views fetch through
//!
//! Implementations are agnostic to transport: [`crate::storage`] provides an
//! in-memory backend and a REST client. Per-kind mutation traits live next to
//! their entities.

use crate::core::entity::Entity;
use crate::core::error::BackendError;
use crate::core::session::{LoginRequest, SessionUser};
use async_trait::async_trait;

/// Loads a whole collection
#[async_trait]
pub trait CollectionService<E: Entity>: Send + Sync {
    /// Fetch every entity of this kind
    async fn fetch_all(&self) -> Result<Vec<E>, BackendError>;
}

/// Authenticates portal users
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for the signed-in user
    async fn login(&self, request: &LoginRequest) -> Result<SessionUser, BackendError>;
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Post;
use crate::error::DomainError;

/// The CRUD capability surface over posts.
///
/// Implementations exclusively own the backing store; every operation is
/// all-or-nothing.
#[async_trait]
pub trait PostService: Send + Sync {
    /// Store a new post, assigning an id (unless supplied) and timestamps.
    async fn create(&self, post: Post) -> Result<Post, DomainError>;

    async fn get(&self, id: Uuid) -> Result<Post, DomainError>;

    /// Snapshot of all posts in insertion order.
    async fn list(&self) -> Result<Vec<Post>, DomainError>;

    /// Replace title and body of an existing post.
    ///
    /// With `expected_revision` set, the update is rejected with
    /// `DomainError::Conflict` unless the stored revision matches.
    async fn update(
        &self,
        id: Uuid,
        post: Post,
        expected_revision: Option<i64>,
    ) -> Result<Post, DomainError>;

    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}

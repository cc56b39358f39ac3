use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Post;
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Fails with `RepoError::Constraint` if the ID is taken.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Fails with `RepoError::NotFound` if absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post repository - the backing store owned by a `PostService`.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// All posts, in creation order. Every call returns a fresh snapshot.
    async fn find_all(&self) -> Result<Vec<Post>, RepoError>;

    /// Replace the stored post only if its revision still equals `expected_revision`.
    ///
    /// Fails with `RepoError::NotFound` when the post is gone and with
    /// `RepoError::StaleRevision` when another writer got there first.
    async fn update_if_revision(&self, post: Post, expected_revision: i64)
    -> Result<Post, RepoError>;
}

//! In-memory post store - used when no database is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use tt_core::domain::Post;
use tt_core::error::RepoError;
use tt_core::ports::{BaseRepository, PostRepository};

#[derive(Default)]
struct Store {
    posts: HashMap<Uuid, Post>,
    /// Ids in insertion order.
    order: Vec<Uuid>,
}

/// Post store held in process memory.
///
/// Every mutation runs under a single write lock, so operations on the same
/// id are serialized and never observed half-applied.
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<Store>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.posts.get(&id).cloned())
    }

    async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        if store.posts.contains_key(&entity.id) {
            return Err(RepoError::Constraint(format!(
                "post {} already exists",
                entity.id
            )));
        }

        store.order.push(entity.id);
        store.posts.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;

        if store.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        store.order.retain(|existing| *existing != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.posts.get(id).cloned())
            .collect())
    }

    async fn update_if_revision(
        &self,
        post: Post,
        expected_revision: i64,
    ) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;

        let current = store.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        if current.revision != expected_revision {
            return Err(RepoError::StaleRevision {
                expected: expected_revision,
            });
        }

        *current = post.clone();
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use tt_core::ports::PostService;
    use tt_core::services::DefaultPostService;
    use tt_core::DomainError;

    fn stored(title: &str) -> Post {
        Post::new(title, "body").stamped_for_insert(Utc::now())
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryPostRepository::new();
        let post = repo.insert(stored("Hello")).await.unwrap();

        let found = repo.find_by_id(post.id).await.unwrap();

        assert_eq!(found, Some(post));
    }

    #[tokio::test]
    async fn test_insert_duplicate_is_constraint_violation() {
        let repo = InMemoryPostRepository::new();
        let post = repo.insert(stored("Hello")).await.unwrap();

        let result = repo.insert(post).await;

        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_find_all_keeps_insertion_order_after_delete() {
        let repo = InMemoryPostRepository::new();
        let a = repo.insert(stored("a")).await.unwrap();
        let b = repo.insert(stored("b")).await.unwrap();
        let c = repo.insert(stored("c")).await.unwrap();

        repo.delete(b.id).await.unwrap();

        let ids: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[tokio::test]
    async fn test_update_if_revision_rejects_stale_writer() {
        let repo = InMemoryPostRepository::new();
        let post = repo.insert(stored("Hello")).await.unwrap();

        let first = post.apply_update(Post::new("First", ""), Utc::now());
        let second = post.apply_update(Post::new("Second", ""), Utc::now());

        assert!(repo.update_if_revision(first, 1).await.is_ok());
        assert!(matches!(
            repo.update_if_revision(second, 1).await,
            Err(RepoError::StaleRevision { expected: 1 })
        ));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let result = repo.update_if_revision(stored("ghost"), 1).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_concurrent_updates_with_same_revision_have_one_winner() {
        let service = Arc::new(DefaultPostService::new(Arc::new(
            InMemoryPostRepository::new(),
        )));
        let created = service.create(Post::new("Hello", "World")).await.unwrap();

        let updates = (0..8).map(|i| {
            let service = service.clone();
            let id = created.id;
            let revision = created.revision;
            tokio::spawn(async move {
                service
                    .update(id, Post::new(format!("Edit {i}"), ""), Some(revision))
                    .await
            })
        });
        let results = futures::future::join_all(updates).await;

        let (won, lost): (Vec<_>, Vec<_>) = results
            .into_iter()
            .map(|joined| joined.unwrap())
            .partition(|r| r.is_ok());
        assert_eq!(won.len(), 1);
        assert!(
            lost.iter()
                .all(|r| matches!(r, Err(DomainError::Conflict(_))))
        );
        assert_eq!(service.get(created.id).await.unwrap().revision, 2);
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let repo = InMemoryPostRepository::new();
        let post = repo.insert(stored("Hello")).await.unwrap();

        assert!(repo.delete(post.id).await.is_ok());
        assert!(matches!(repo.delete(post.id).await, Err(RepoError::NotFound)));
    }
}

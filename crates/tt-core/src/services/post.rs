use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::Post;
use crate::error::{DomainError, RepoError};
use crate::ports::{PostRepository, PostService};

const ENTITY: &str = "Post";

/// `PostService` backed by any `PostRepository`.
pub struct DefaultPostService {
    repo: Arc<dyn PostRepository>,
}

impl DefaultPostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    fn not_found(id: Uuid) -> DomainError {
        DomainError::NotFound {
            entity_type: ENTITY,
            id,
        }
    }
}

/// Translate store failures that carry no per-operation meaning.
fn store_error(err: RepoError) -> DomainError {
    match err {
        RepoError::Connection(msg) => {
            tracing::error!(error = %msg, "Post store unreachable");
            DomainError::StoreUnavailable(msg)
        }
        RepoError::Query(msg) => DomainError::Internal(msg),
        RepoError::Constraint(msg) => {
            tracing::warn!(error = %msg, "Post store rejected a write");
            DomainError::Conflict("post conflicts with stored data".to_string())
        }
        RepoError::StaleRevision { expected } => DomainError::Conflict(format!(
            "post was modified concurrently (expected revision {expected})"
        )),
        RepoError::NotFound => DomainError::Internal("unexpected missing record".to_string()),
    }
}

#[async_trait]
impl PostService for DefaultPostService {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let supplied_id = post.has_id().then_some(post.id);
        let post = post.stamped_for_insert(Utc::now());

        let created = self.repo.insert(post).await.map_err(|e| match e {
            RepoError::Constraint(_) => DomainError::Conflict(format!(
                "post with id {} already exists",
                supplied_id.unwrap_or_default()
            )),
            other => store_error(other),
        })?;

        tracing::debug!(post_id = %created.id, "Post created");
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| Self::not_found(id))
    }

    async fn list(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.find_all().await.map_err(store_error)
    }

    async fn update(
        &self,
        id: Uuid,
        post: Post,
        expected_revision: Option<i64>,
    ) -> Result<Post, DomainError> {
        let current = self.get(id).await?;

        let expected = expected_revision.unwrap_or(current.revision);
        if expected != current.revision {
            return Err(DomainError::Conflict(format!(
                "post {id} is at revision {}, not {expected}",
                current.revision
            )));
        }

        let next = current.apply_update(post, Utc::now());
        let updated = self
            .repo
            .update_if_revision(next, expected)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => Self::not_found(id),
                other => store_error(other),
            })?;

        tracing::debug!(post_id = %id, revision = updated.revision, "Post updated");
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id).await.map_err(|e| match e {
            RepoError::NotFound => Self::not_found(id),
            other => store_error(other),
        })?;

        tracing::debug!(post_id = %id, "Post deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::BaseRepository;
    use tokio::sync::Mutex;

    /// Minimal store for exercising service rules.
    #[derive(Default)]
    struct VecRepository {
        posts: Mutex<Vec<Post>>,
        unreachable: bool,
    }

    impl VecRepository {
        fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), RepoError> {
            if self.unreachable {
                return Err(RepoError::Connection("connection refused".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BaseRepository<Post, Uuid> for VecRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            self.check()?;
            let posts = self.posts.lock().await;
            Ok(posts.iter().find(|p| p.id == id).cloned())
        }

        async fn insert(&self, entity: Post) -> Result<Post, RepoError> {
            self.check()?;
            let mut posts = self.posts.lock().await;
            if posts.iter().any(|p| p.id == entity.id) {
                return Err(RepoError::Constraint("duplicate id".to_string()));
            }
            posts.push(entity.clone());
            Ok(entity)
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.check()?;
            let mut posts = self.posts.lock().await;
            let before = posts.len();
            posts.retain(|p| p.id != id);
            if posts.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PostRepository for VecRepository {
        async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
            self.check()?;
            Ok(self.posts.lock().await.clone())
        }

        async fn update_if_revision(
            &self,
            post: Post,
            expected_revision: i64,
        ) -> Result<Post, RepoError> {
            self.check()?;
            let mut posts = self.posts.lock().await;
            let slot = posts
                .iter_mut()
                .find(|p| p.id == post.id)
                .ok_or(RepoError::NotFound)?;
            if slot.revision != expected_revision {
                return Err(RepoError::StaleRevision {
                    expected: expected_revision,
                });
            }
            *slot = post.clone();
            Ok(post)
        }
    }

    fn service() -> DefaultPostService {
        DefaultPostService::new(Arc::new(VecRepository::default()))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let service = service();

        let created = service.create(Post::new("Hello", "World")).await.unwrap();

        assert!(created.has_id());
        assert_eq!(created.title, "Hello");
        assert_eq!(created.revision, 1);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_create_with_existing_id_conflicts() {
        let service = service();
        let first = service.create(Post::new("One", "")).await.unwrap();

        let duplicate = Post {
            id: first.id,
            ..Post::new("Two", "")
        };
        let result = service.create(duplicate).await;

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let service = service();
        let result = service.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_returns_insertion_order() {
        let service = service();
        for title in ["a", "b", "c"] {
            service.create(Post::new(title, "")).await.unwrap();
        }

        let titles: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_update_bumps_revision_and_keeps_created_at() {
        let service = service();
        let created = service.create(Post::new("Old", "body")).await.unwrap();

        let updated = service
            .update(created.id, Post::new("New", "body"), None)
            .await
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.revision, created.revision + 1);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_with_stale_revision_conflicts() {
        let service = service();
        let created = service.create(Post::new("Old", "")).await.unwrap();

        service
            .update(created.id, Post::new("First", ""), Some(created.revision))
            .await
            .unwrap();
        let second = service
            .update(created.id, Post::new("Second", ""), Some(created.revision))
            .await;

        assert!(matches!(second, Err(DomainError::Conflict(_))));
        assert_eq!(service.get(created.id).await.unwrap().title, "First");
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let service = service();
        let result = service
            .update(Uuid::new_v4(), Post::new("x", ""), None)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_twice_reports_not_found() {
        let service = service();
        let created = service.create(Post::new("Bye", "")).await.unwrap();

        assert!(service.delete(created.id).await.is_ok());
        let second = service.delete(created.id).await;

        assert!(matches!(second, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_reported() {
        let service = DefaultPostService::new(Arc::new(VecRepository::unreachable()));
        let result = service.list().await;
        assert!(matches!(result, Err(DomainError::StoreUnavailable(_))));
    }

    #[test]
    fn test_constraint_detail_stays_internal() {
        let err = store_error(RepoError::Constraint(
            "duplicate key value violates unique constraint \"posts_pkey\"".to_string(),
        ));

        match err {
            DomainError::Conflict(msg) => assert!(!msg.contains("posts_pkey")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}

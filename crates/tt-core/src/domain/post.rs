use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - represents a blog post or article.
///
/// A nil `id` means the post has not been assigned an identifier yet.
/// `revision` is internal to the store and is bumped on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new, not yet stored post.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            title: title.into(),
            body: body.into(),
            revision: 0,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Whether an identifier has been assigned (by the caller or the store).
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// Prepare this post for first insertion: assign an id if missing,
    /// stamp both timestamps and start at revision 1.
    pub fn stamped_for_insert(mut self, now: DateTime<Utc>) -> Self {
        if !self.has_id() {
            self.id = Uuid::new_v4();
        }
        self.revision = 1;
        self.created_at = now;
        self.updated_at = now;
        self
    }

    /// Apply the client-editable fields of `changes` on top of `self`,
    /// keeping identity and creation time, and advancing the revision.
    pub fn apply_update(&self, changes: Post, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            title: changes.title,
            body: changes.body,
            revision: self.revision + 1,
            created_at: self.created_at,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_is_unassigned() {
        let post = Post::new("Hello", "World");
        assert!(!post.has_id());
        assert_eq!(post.revision, 0);
    }

    #[test]
    fn test_stamped_for_insert_keeps_caller_id() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let post = Post {
            id,
            ..Post::new("Hello", "World")
        }
        .stamped_for_insert(now);

        assert_eq!(post.id, id);
        assert_eq!(post.revision, 1);
        assert_eq!(post.created_at, now);
        assert_eq!(post.updated_at, now);
    }

    #[test]
    fn test_apply_update_preserves_identity() {
        let created = Utc::now();
        let stored = Post::new("Old", "old body").stamped_for_insert(created);
        let later = created + chrono::TimeDelta::seconds(5);

        let updated = stored.apply_update(Post::new("New", "new body"), later);

        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.title, "New");
        assert_eq!(updated.body, "new body");
        assert_eq!(updated.revision, 2);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);
    }
}

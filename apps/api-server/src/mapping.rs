//! Conversions between the wire `PostDto` and the domain `Post`.
//!
//! Both directions are pure and infallible. Payloads are validated before
//! `to_domain` is called, so anything it cannot interpret falls back to the
//! "unassigned" value of the domain field.

use chrono::{DateTime, Utc};
use tt_core::domain::Post;
use tt_shared::PostDto;
use uuid::Uuid;

pub fn to_domain(dto: PostDto) -> Post {
    Post {
        id: dto
            .id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_default(),
        title: dto.title.unwrap_or_default(),
        body: dto.body.unwrap_or_default(),
        revision: 0,
        created_at: dto.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        updated_at: dto.updated_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    }
}

/// The revision is internal and never leaves the server in the body.
pub fn to_dto(post: Post) -> PostDto {
    PostDto {
        id: post.has_id().then(|| post.id.to_string()),
        title: Some(post.title),
        body: Some(post.body),
        created_at: assigned(post.created_at),
        updated_at: assigned(post.updated_at),
    }
}

fn assigned(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (at != DateTime::<Utc>::UNIX_EPOCH).then_some(at)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Post {
        Post::new("Hello", "World").stamped_for_insert(Utc::now())
    }

    #[test]
    fn test_roundtrip_of_stored_post() {
        let post = stored();

        let back = to_domain(to_dto(post.clone()));

        assert_eq!(back.id, post.id);
        assert_eq!(back.title, post.title);
        assert_eq!(back.body, post.body);
        assert_eq!(back.created_at, post.created_at);
        assert_eq!(back.updated_at, post.updated_at);
    }

    #[test]
    fn test_revision_is_dropped() {
        let dto = to_dto(stored());
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("revision").is_none());
    }

    #[test]
    fn test_create_payload_maps_to_unassigned_post() {
        let post = to_domain(PostDto::new("Hello", "World"));

        assert!(!post.has_id());
        assert_eq!(post.title, "Hello");
        assert_eq!(post.created_at, DateTime::<Utc>::UNIX_EPOCH);

        let dto = to_dto(post);
        assert_eq!(dto, PostDto::new("Hello", "World"));
    }
}

//! Post handlers.
//!
//! Each write runs the same pipeline: the JSON extractor parses the body,
//! the validator checks it, the mapper turns it into a domain `Post`, the
//! service performs the operation and the result is mapped back to a
//! `PostDto`. Errors leave through `AppError`, one status per kind.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use uuid::Uuid;

use tt_core::domain::Post;
use tt_shared::PostDto;

use crate::mapping;
use crate::middleware::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// A path segment that is not a UUID cannot name any stored post.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFound(format!("Post with id {} not found", raw)))
}

fn etag(post: &Post) -> String {
    format!("\"{}\"", post.revision)
}

/// Revision the client expects to overwrite, from `If-Match`.
///
/// Absent or `*` means "whatever is stored now".
fn expected_revision(req: &HttpRequest) -> AppResult<Option<i64>> {
    let Some(value) = req.headers().get(header::IF_MATCH) else {
        return Ok(None);
    };

    let malformed =
        || AppError::BadRequest("If-Match must be an ETag returned for this post".to_string());
    let raw = value.to_str().map_err(|_| malformed())?.trim();
    if raw == "*" {
        return Ok(None);
    }

    raw.trim_start_matches("W/")
        .trim_matches('"')
        .parse::<i64>()
        .map(Some)
        .map_err(|_| malformed())
}

/// Run the validator; any failure ends the request with every field listed.
fn validate(state: &AppState, dto: &PostDto) -> AppResult<()> {
    let result = state.validator.validate(dto);
    if result.is_valid() {
        return Ok(());
    }

    tracing::debug!(failures = result.errors().len(), "Post payload rejected");
    Err(AppError::Validation(result.into_errors()))
}

/// POST /posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostDto>,
) -> AppResult<HttpResponse> {
    let dto = body.into_inner();
    validate(&state, &dto)?;

    let post = state.posts.create(mapping::to_domain(dto)).await?;
    tracing::info!(post_id = %post.id, subject = %identity.subject, "Post created");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/posts/{}", post.id)))
        .insert_header((header::ETAG, etag(&post)))
        .json(mapping::to_dto(post)))
}

/// GET /posts
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts: Vec<PostDto> = state
        .posts
        .list()
        .await?
        .into_iter()
        .map(mapping::to_dto)
        .collect();

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state.posts.get(id).await?;

    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, etag(&post)))
        .json(mapping::to_dto(post)))
}

/// PUT /posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<PostDto>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let expected = expected_revision(&req)?;
    let dto = body.into_inner();

    let mut result = state.validator.validate(&dto);
    if let Some(body_id) = dto.id.as_deref()
        && Uuid::parse_str(body_id).is_ok_and(|body_id| body_id != id)
    {
        result.add("id", "must match the identifier in the request path");
    }
    if !result.is_valid() {
        return Err(AppError::Validation(result.into_errors()));
    }

    let post = state
        .posts
        .update(id, mapping::to_domain(dto), expected)
        .await?;
    tracing::info!(
        post_id = %post.id,
        revision = post.revision,
        subject = %identity.subject,
        "Post updated"
    );

    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, etag(&post)))
        .json(mapping::to_dto(post)))
}

/// DELETE /posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    state.posts.delete(id).await?;
    tracing::info!(post_id = %id, subject = %identity.subject, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

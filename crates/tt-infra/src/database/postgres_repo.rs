//! PostgreSQL post repository.

use async_trait::async_trait;
use chrono::SubsecRound;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use tt_core::domain::Post;
use tt_core::error::RepoError;
use tt_core::ports::{BaseRepository, PostRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_all(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update_if_revision(
        &self,
        post: Post,
        expected_revision: i64,
    ) -> Result<Post, RepoError> {
        // Postgres keeps microseconds; return what a later read will see
        let post = Post {
            updated_at: post.updated_at.trunc_subsecs(6),
            ..post
        };
        let row = post::Model::from(post.clone());
        let result = PostEntity::update_many()
            .col_expr(post::Column::Title, Expr::value(row.title))
            .col_expr(post::Column::Body, Expr::value(row.body))
            .col_expr(post::Column::Revision, Expr::value(row.revision))
            .col_expr(post::Column::UpdatedAt, Expr::value(row.updated_at))
            .filter(post::Column::Id.eq(post.id))
            .filter(post::Column::Revision.eq(expected_revision))
            .exec(&self.db)
            .await
            .map_err(repo_error)?;

        if result.rows_affected == 1 {
            return Ok(post);
        }

        // Nothing matched: either the row is gone or another writer bumped the revision.
        let exists = <Self as BaseRepository<Post, Uuid>>::find_by_id(self, post.id).await?;
        match exists {
            Some(_) => {
                tracing::debug!(post_id = %post.id, expected_revision, "Stale post revision");
                Err(RepoError::StaleRevision {
                    expected: expected_revision,
                })
            }
            None => Err(RepoError::NotFound),
        }
    }
}

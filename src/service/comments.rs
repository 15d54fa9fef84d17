//! Comments on a review, addressed through the review's title.

use super::validation::Validator;
use super::{fetch_page, Listing};
use crate::error::AppError;
use crate::models::{CommentView, User};
use crate::response::PageRequest;
use crate::sql::ListQuery;
use serde::Deserialize;
use sqlx::PgPool;

const COMMENT_SELECT: &str = "c.id, c.text, u.username AS author, c.pub_date, c.author_id";
const COMMENT_FROM: &str = "comments c JOIN users u ON u.id = c.author_id";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

impl CommentInput {
    /// With `partial` a missing text is allowed and means "keep".
    pub fn validate(&self, partial: bool) -> Result<Option<&str>, AppError> {
        let mut v = Validator::new();
        match &self.text {
            Some(text) => {
                v.not_blank("text", text);
            }
            None if !partial => v.add("text", "This field is required."),
            None => {}
        }
        v.finish()?;
        Ok(self.text.as_deref())
    }
}

pub struct CommentService;

impl CommentService {
    /// 404 unless `review_id` is a review of `title_id`.
    async fn require_review(pool: &PgPool, title_id: i64, review_id: i64) -> Result<(), AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM reviews WHERE id = $1 AND title_id = $2")
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(pool)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))
    }

    pub async fn list(
        pool: &PgPool,
        title_id: i64,
        review_id: i64,
        page: PageRequest,
    ) -> Result<Listing<CommentView>, AppError> {
        Self::require_review(pool, title_id, review_id).await?;
        let mut q = ListQuery::new(COMMENT_SELECT, COMMENT_FROM, "c.pub_date, c.id");
        q.where_eq("c.review_id", review_id);
        fetch_page(pool, &q, page).await
    }

    pub async fn get(
        pool: &PgPool,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<CommentView>, AppError> {
        Self::require_review(pool, title_id, review_id).await?;
        let sql = format!(
            "SELECT {} FROM {} WHERE c.id = $1 AND c.review_id = $2",
            COMMENT_SELECT, COMMENT_FROM
        );
        Ok(sqlx::query_as::<_, CommentView>(&sql)
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn create(
        pool: &PgPool,
        title_id: i64,
        review_id: i64,
        author: &User,
        input: &CommentInput,
    ) -> Result<CommentView, AppError> {
        Self::require_review(pool, title_id, review_id).await?;
        let text = input.validate(false)?.unwrap_or_default();
        let comment = sqlx::query_as::<_, CommentView>(
            "WITH c AS (INSERT INTO comments (review_id, author_id, text) VALUES ($1, $2, $3) RETURNING *) \
             SELECT c.id, c.text, u.username AS author, c.pub_date, c.author_id \
             FROM c JOIN users u ON u.id = c.author_id",
        )
        .bind(review_id)
        .bind(author.id)
        .bind(text)
        .fetch_one(pool)
        .await?;
        tracing::info!(review_id, comment_id = comment.id, author = %author.username, "comment created");
        Ok(comment)
    }

    /// Only the text is editable; author and review stay fixed.
    pub async fn update(pool: &PgPool, comment_id: i64, input: &CommentInput, partial: bool) -> Result<CommentView, AppError> {
        let text = input.validate(partial)?;
        sqlx::query_as::<_, CommentView>(
            "WITH c AS (UPDATE comments SET text = COALESCE($2, text) WHERE id = $1 RETURNING *) \
             SELECT c.id, c.text, u.username AS author, c.pub_date, c.author_id \
             FROM c JOIN users u ON u.id = c.author_id",
        )
        .bind(comment_id)
        .bind(text)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))
    }

    pub async fn delete(pool: &PgPool, comment_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Reviews of a title: one per author, score 1..=10.

use super::titles::TitleService;
use super::validation::Validator;
use super::{fetch_page, Listing};
use crate::error::{is_unique_violation, AppError};
use crate::models::{ReviewView, User};
use crate::response::PageRequest;
use crate::sql::ListQuery;
use serde::Deserialize;
use sqlx::PgPool;

const REVIEW_SELECT: &str = "r.id, r.text, u.username AS author, r.score, r.pub_date, r.author_id";
const REVIEW_FROM: &str = "reviews r JOIN users u ON u.id = r.author_id";
const DUPLICATE_REVIEW: &str = "You cannot add more than one review for a title.";

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReviewInput {
    pub text: Option<String>,
    pub score: Option<i64>,
}

impl ReviewInput {
    pub fn validate(&self, partial: bool) -> Result<(), AppError> {
        let mut v = Validator::new();
        match &self.text {
            Some(text) => {
                v.not_blank("text", text);
            }
            None if !partial => v.add("text", "This field is required."),
            None => {}
        }
        match self.score {
            Some(score) => v.score("score", score),
            None if !partial => v.add("score", "This field is required."),
            None => {}
        }
        v.finish()
    }
}

pub struct ReviewService;

impl ReviewService {
    async fn require_title(pool: &PgPool, title_id: i64) -> Result<(), AppError> {
        if TitleService::exists(pool, title_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("title {}", title_id)))
        }
    }

    /// Reviews of a title, oldest first. Unknown title is 404.
    pub async fn list(pool: &PgPool, title_id: i64, page: PageRequest) -> Result<Listing<ReviewView>, AppError> {
        Self::require_title(pool, title_id).await?;
        let mut q = ListQuery::new(REVIEW_SELECT, REVIEW_FROM, "r.pub_date, r.id");
        q.where_eq("r.title_id", title_id);
        fetch_page(pool, &q, page).await
    }

    /// A review only if it belongs to `title_id`.
    pub async fn get(pool: &PgPool, title_id: i64, review_id: i64) -> Result<Option<ReviewView>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE r.id = $1 AND r.title_id = $2",
            REVIEW_SELECT, REVIEW_FROM
        );
        Ok(sqlx::query_as::<_, ReviewView>(&sql)
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn create(pool: &PgPool, title_id: i64, author: &User, input: &ReviewInput) -> Result<ReviewView, AppError> {
        Self::require_title(pool, title_id).await?;
        input.validate(false)?;
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM reviews WHERE title_id = $1 AND author_id = $2")
            .bind(title_id)
            .bind(author.id)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::non_field(DUPLICATE_REVIEW));
        }
        let review = sqlx::query_as::<_, ReviewView>(
            "WITH r AS (INSERT INTO reviews (title_id, author_id, text, score) VALUES ($1, $2, $3, $4) RETURNING *) \
             SELECT r.id, r.text, u.username AS author, r.score, r.pub_date, r.author_id \
             FROM r JOIN users u ON u.id = r.author_id",
        )
        .bind(title_id)
        .bind(author.id)
        .bind(input.text.as_deref().unwrap_or_default())
        .bind(input.score.unwrap_or_default() as i16)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::non_field(DUPLICATE_REVIEW)
            } else {
                AppError::Db(e)
            }
        })?;
        tracing::info!(title_id, review_id = review.id, author = %author.username, "review created");
        Ok(review)
    }

    /// Change text and/or score; author and title stay fixed.
    pub async fn update(pool: &PgPool, review_id: i64, input: &ReviewInput, partial: bool) -> Result<ReviewView, AppError> {
        input.validate(partial)?;
        let review = sqlx::query_as::<_, ReviewView>(
            "WITH r AS (UPDATE reviews SET text = COALESCE($2, text), score = COALESCE($3, score) \
             WHERE id = $1 RETURNING *) \
             SELECT r.id, r.text, u.username AS author, r.score, r.pub_date, r.author_id \
             FROM r JOIN users u ON u.id = r.author_id",
        )
        .bind(review_id)
        .bind(input.text.as_deref())
        .bind(input.score.map(|s| s as i16))
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))?;
        Ok(review)
    }

    pub async fn delete(pool: &PgPool, review_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Titles with their category, genres and average review score.

use super::catalog::{TagKind, TagService};
use super::validation::{current_year, Validator, NAME_MAX};
use super::{fetch_page, Listing};
use crate::error::{AppError, FieldErrors};
use crate::models::{Tag, TitleRow, TitleView};
use crate::response::PageRequest;
use crate::sql::ListQuery;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;

/// Integer part of the average score; NULL without reviews.
const TITLE_SELECT: &str = "t.id, t.name, t.year, t.description, \
     (SELECT TRUNC(AVG(r.score))::INTEGER FROM reviews r WHERE r.title_id = t.id) AS rating, \
     c.name AS category_name, c.slug AS category_slug";
const TITLE_FROM: &str = "titles t LEFT JOIN categories c ON c.id = t.category_id";

/// Query-string filters for the title list.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TitleFilters {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TitleInput {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

/// Validated title fields with slugs resolved to ids. `None` means "keep" on partial updates.
struct ResolvedTitle {
    name: Option<String>,
    year: Option<i32>,
    description: Option<String>,
    category_id: Option<i64>,
    genre_ids: Option<Vec<i64>>,
}

impl TitleInput {
    fn validate(&self, partial: bool, current_year: i64) -> FieldErrors {
        let mut v = Validator::new();
        match &self.name {
            Some(name) => v.name("name", name, NAME_MAX),
            None if !partial => v.add("name", "This field is required."),
            None => {}
        }
        match self.year {
            Some(year) => v.year("year", year, current_year),
            None if !partial => v.add("year", "This field is required."),
            None => {}
        }
        match &self.category {
            Some(slug) => {
                v.not_blank("category", slug);
            }
            None if !partial => v.add("category", "This field is required."),
            None => {}
        }
        match &self.genre {
            Some(slugs) if slugs.is_empty() => v.add("genre", "This list may not be empty."),
            Some(_) => {}
            None if !partial => v.add("genre", "This field is required."),
            None => {}
        }
        v.into_errors()
    }

    /// Validate, then look up category and genre slugs. Unknown slugs are field errors.
    async fn resolve(&self, pool: &PgPool, partial: bool) -> Result<ResolvedTitle, AppError> {
        let mut errors = self.validate(partial, current_year());

        let mut category_id = None;
        if let Some(slug) = self.category.as_deref().filter(|s| !s.trim().is_empty()) {
            match TagService::get_by_slug(pool, TagKind::Category, slug).await? {
                Some(tag) => category_id = Some(tag.id),
                None => errors.add("category", format!("Object with slug={} does not exist.", slug)),
            }
        }

        let mut genre_ids = None;
        if let Some(slugs) = self.genre.as_ref().filter(|s| !s.is_empty()) {
            let found = TagService::get_by_slugs(pool, TagKind::Genre, slugs).await?;
            let by_slug: HashMap<&str, i64> = found.iter().map(|g| (g.slug.as_str(), g.id)).collect();
            let mut ids = Vec::with_capacity(slugs.len());
            for slug in slugs {
                match by_slug.get(slug.as_str()) {
                    Some(id) if !ids.contains(id) => ids.push(*id),
                    Some(_) => {}
                    None => errors.add("genre", format!("Object with slug={} does not exist.", slug)),
                }
            }
            genre_ids = Some(ids);
        }

        errors.into_result()?;
        Ok(ResolvedTitle {
            name: self.name.clone(),
            year: self.year.map(|y| y as i32),
            description: self.description.clone(),
            category_id,
            genre_ids,
        })
    }
}

/// Query parameters given without a value do not filter.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

pub struct TitleService;

impl TitleService {
    pub async fn list(pool: &PgPool, filters: &TitleFilters, page: PageRequest) -> Result<Listing<TitleView>, AppError> {
        let mut q = ListQuery::new(TITLE_SELECT, TITLE_FROM, "t.name, t.id");
        if let Some(slug) = non_empty(&filters.category) {
            q.where_eq("c.slug", slug);
        }
        if let Some(slug) = non_empty(&filters.genre) {
            q.where_with(slug, |n| {
                format!(
                    "EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
                     WHERE tg.title_id = t.id AND g.slug = ${})",
                    n
                )
            });
        }
        if let Some(name) = non_empty(&filters.name) {
            q.where_eq("t.name", name);
        }
        if let Some(raw) = non_empty(&filters.year) {
            let year: i64 = raw
                .trim()
                .parse()
                .map_err(|_| AppError::field("year", "Enter a number."))?;
            q.where_eq("t.year", year);
        }
        let listing: Listing<TitleRow> = fetch_page(pool, &q, page).await?;
        let ids: Vec<i64> = listing.items.iter().map(|t| t.id).collect();
        let mut genres = Self::genres_for(pool, &ids).await?;
        Ok(listing.map(|row| {
            let g = genres.remove(&row.id).unwrap_or_default();
            TitleView::from_row(row, g)
        }))
    }

    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<TitleView>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE t.id = $1", TITLE_SELECT, TITLE_FROM);
        let Some(row) = sqlx::query_as::<_, TitleRow>(&sql).bind(id).fetch_optional(pool).await? else {
            return Ok(None);
        };
        let mut genres = Self::genres_for(pool, &[id]).await?;
        Ok(Some(TitleView::from_row(row, genres.remove(&id).unwrap_or_default())))
    }

    pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM titles WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(found.is_some())
    }

    /// Genres of each title in `ids`, ordered by name.
    async fn genres_for(pool: &PgPool, ids: &[i64]) -> Result<HashMap<i64, Vec<Tag>>, AppError> {
        let mut out: HashMap<i64, Vec<Tag>> = HashMap::new();
        if ids.is_empty() {
            return Ok(out);
        }
        let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT tg.title_id, g.id, g.name, g.slug FROM title_genres tg \
             JOIN genres g ON g.id = tg.genre_id WHERE tg.title_id = ANY($1) ORDER BY g.name, g.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        for (title_id, id, name, slug) in rows {
            out.entry(title_id).or_default().push(Tag { id, name, slug });
        }
        Ok(out)
    }

    pub async fn create(pool: &PgPool, input: &TitleInput) -> Result<TitleView, AppError> {
        let t = input.resolve(pool, false).await?;
        let mut tx = pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(t.name.as_deref().unwrap_or_default())
        .bind(t.year.unwrap_or_default())
        .bind(t.description.as_deref().unwrap_or_default())
        .bind(t.category_id)
        .fetch_one(&mut *tx)
        .await?;
        if let Some(genre_ids) = &t.genre_ids {
            Self::replace_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await?;
        tracing::info!(title_id = id, "title created");
        Self::get(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Update a title; `partial` keeps fields absent from `input`. Returns `None` for an unknown id.
    pub async fn update(pool: &PgPool, id: i64, input: &TitleInput, partial: bool) -> Result<Option<TitleView>, AppError> {
        if !Self::exists(pool, id).await? {
            return Ok(None);
        }
        let t = input.resolve(pool, partial).await?;
        let mut tx = pool.begin().await?;
        sqlx::query(
            "UPDATE titles SET name = COALESCE($2, name), year = COALESCE($3, year), \
             description = COALESCE($4, description), \
             category_id = CASE WHEN $5 THEN $6 ELSE category_id END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(t.name.as_deref())
        .bind(t.year)
        .bind(t.description.as_deref())
        .bind(t.category_id.is_some())
        .bind(t.category_id)
        .execute(&mut *tx)
        .await?;
        if let Some(genre_ids) = &t.genre_ids {
            Self::replace_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await?;
        tracing::info!(title_id = id, partial, "title updated");
        Self::get(pool, id).await
    }

    async fn replace_genres(tx: &mut sqlx::PgConnection, title_id: i64, genre_ids: &[i64]) -> Result<(), AppError> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO title_genres (title_id, genre_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        )
        .bind(title_id)
        .bind(genre_ids)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Reviews and their comments are removed with the title.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1").bind(id).execute(pool).await?;
        if result.rows_affected() > 0 {
            tracing::info!(title_id = id, "title deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}

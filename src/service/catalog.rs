//! Categories and genres. Both are `{name, slug}` lookup tables addressed by slug.

use super::validation::{Validator, NAME_MAX};
use super::{fetch_page, Listing};
use crate::error::{is_unique_violation, AppError};
use crate::models::Tag;
use crate::response::PageRequest;
use crate::sql::ListQuery;
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagKind {
    Category,
    Genre,
}

impl TagKind {
    fn table(&self) -> &'static str {
        match self {
            TagKind::Category => "categories",
            TagKind::Genre => "genres",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TagKind::Category => "category",
            TagKind::Genre => "genre",
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TagInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl TagInput {
    fn validate(&self) -> Result<(&str, &str), AppError> {
        let mut v = Validator::new();
        if let Some(name) = v.required("name", self.name.as_ref()) {
            v.name("name", name, NAME_MAX);
        }
        if let Some(slug) = v.required("slug", self.slug.as_ref()) {
            v.slug("slug", slug);
        }
        v.finish()?;
        match (self.name.as_deref(), self.slug.as_deref()) {
            (Some(name), Some(slug)) => Ok((name, slug)),
            _ => Err(AppError::non_field("name and slug are required")),
        }
    }
}

pub struct TagService;

impl TagService {
    /// Ordered by name; `search` is a case-insensitive substring of the name.
    pub async fn list(
        pool: &PgPool,
        kind: TagKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Listing<Tag>, AppError> {
        let mut q = ListQuery::new("id, name, slug", kind.table(), "name, id");
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            q.where_contains("name", term);
        }
        fetch_page(pool, &q, page).await
    }

    pub async fn get_by_slug(pool: &PgPool, kind: TagKind, slug: &str) -> Result<Option<Tag>, AppError> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = $1", kind.table());
        Ok(sqlx::query_as::<_, Tag>(&sql).bind(slug).fetch_optional(pool).await?)
    }

    /// All rows whose slug is in `slugs`, in no particular order.
    pub async fn get_by_slugs(pool: &PgPool, kind: TagKind, slugs: &[String]) -> Result<Vec<Tag>, AppError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = ANY($1)", kind.table());
        Ok(sqlx::query_as::<_, Tag>(&sql).bind(slugs).fetch_all(pool).await?)
    }

    pub async fn create(pool: &PgPool, kind: TagKind, input: &TagInput) -> Result<Tag, AppError> {
        let (name, slug) = input.validate()?;
        let duplicate = || AppError::field("slug", format!("{} with this slug already exists.", kind.label()));
        if Self::get_by_slug(pool, kind, slug).await?.is_some() {
            return Err(duplicate());
        }
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            kind.table()
        );
        let tag = sqlx::query_as::<_, Tag>(&sql)
            .bind(name)
            .bind(slug)
            .fetch_one(pool)
            .await
            .map_err(|e| if is_unique_violation(&e) { duplicate() } else { AppError::Db(e) })?;
        tracing::info!(kind = kind.label(), slug = %tag.slug, "created");
        Ok(tag)
    }

    /// Titles keep existing: a deleted category is unset on them, a deleted genre is dropped from them.
    pub async fn delete(pool: &PgPool, kind: TagKind, slug: &str) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE slug = $1", kind.table());
        let result = sqlx::query(&sql).bind(slug).execute(pool).await?;
        if result.rows_affected() > 0 {
            tracing::info!(kind = kind.label(), slug = %slug, "deleted");
        }
        Ok(result.rows_affected() > 0)
    }
}

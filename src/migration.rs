//! Apply the relational schema: users, categories, genres, titles, reviews, comments.
//! Statements are ordered by foreign-key dependency and are idempotent.

use crate::error::AppError;
use sqlx::PgPool;

const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(150) NOT NULL UNIQUE,
            email VARCHAR(254) NOT NULL UNIQUE,
            first_name VARCHAR(150) NOT NULL DEFAULT '',
            last_name VARCHAR(150) NOT NULL DEFAULT '',
            bio TEXT NOT NULL DEFAULT '',
            role VARCHAR(9) NOT NULL DEFAULT 'user'
                CHECK (role IN ('user', 'moderator', 'admin')),
            is_staff BOOLEAN NOT NULL DEFAULT FALSE,
            is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
            confirmation_code VARCHAR(40)
        )
        "#,
    ),
    (
        "categories",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(256) NOT NULL,
            slug VARCHAR(50) NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "genres",
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(256) NOT NULL,
            slug VARCHAR(50) NOT NULL UNIQUE
        )
        "#,
    ),
    (
        "titles",
        r#"
        CREATE TABLE IF NOT EXISTS titles (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(256) NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL CHECK (year >= 1),
            category_id BIGINT REFERENCES categories (id) ON DELETE SET NULL
        )
        "#,
    ),
    (
        "title_genres",
        r#"
        CREATE TABLE IF NOT EXISTS title_genres (
            title_id BIGINT NOT NULL REFERENCES titles (id) ON DELETE CASCADE,
            genre_id BIGINT NOT NULL REFERENCES genres (id) ON DELETE CASCADE,
            PRIMARY KEY (title_id, genre_id)
        )
        "#,
    ),
    (
        "reviews",
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id BIGSERIAL PRIMARY KEY,
            title_id BIGINT NOT NULL REFERENCES titles (id) ON DELETE CASCADE,
            author_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            score SMALLINT NOT NULL CHECK (score BETWEEN 1 AND 10),
            pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT unique_review UNIQUE (title_id, author_id)
        )
        "#,
    ),
    (
        "reviews_pub_date_idx",
        "CREATE INDEX IF NOT EXISTS reviews_pub_date_idx ON reviews (pub_date)",
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id BIGSERIAL PRIMARY KEY,
            review_id BIGINT NOT NULL REFERENCES reviews (id) ON DELETE CASCADE,
            author_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            pub_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "comments_pub_date_idx",
        "CREATE INDEX IF NOT EXISTS comments_pub_date_idx ON comments (pub_date)",
    ),
];

/// Create every table and index that does not exist yet.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for (name, ddl) in SCHEMA {
        tracing::debug!(object = %name, "migrate");
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(objects = SCHEMA.len(), "schema up to date");
    Ok(())
}

//! Row types and their public representations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("\"{}\" is not a valid choice", s)),
        }
    }
}

/// Account row. `role` is stored as text and parsed on read.
#[derive(Clone, Debug, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub confirmation_code: Option<String>,
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl User {
    /// Admin role, or a staff superuser.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || (self.is_staff && self.is_superuser)
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        UserView {
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            bio: u.bio,
            role: u.role,
        }
    }
}

/// Category or genre: both are `{name, slug}` lookups.
#[derive(Clone, Debug, PartialEq, Eq, FromRow, Serialize)]
pub struct Tag {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Title as read from `titles` with its category joined and rating aggregated.
#[derive(Clone, Debug, FromRow)]
pub struct TitleRow {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub rating: Option<i32>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Read representation: nested category and genres.
#[derive(Clone, Debug, Serialize)]
pub struct TitleView {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<i32>,
    pub description: String,
    pub genre: Vec<Tag>,
    pub category: Option<Tag>,
}

impl TitleView {
    pub fn from_row(row: TitleRow, genre: Vec<Tag>) -> Self {
        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(Tag { id: 0, name, slug }),
            _ => None,
        };
        TitleView {
            id: row.id,
            name: row.name,
            year: row.year,
            rating: row.rating,
            description: row.description,
            genre,
            category,
        }
    }
}

/// Write representation: category and genres by slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TitleWriteView {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: Option<String>,
    pub genre: Vec<String>,
}

impl TitleWriteView {
    pub fn from_view(v: TitleView) -> Self {
        TitleWriteView {
            id: v.id,
            name: v.name,
            year: v.year,
            description: v.description,
            category: v.category.map(|c| c.slug),
            genre: v.genre.into_iter().map(|g| g.slug).collect(),
        }
    }
}

#[derive(Clone, Debug, FromRow, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub score: i16,
    pub pub_date: DateTime<Utc>,
    #[serde(skip)]
    pub author_id: i64,
}

#[derive(Clone, Debug, FromRow, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
    #[serde(skip)]
    pub author_id: i64,
}

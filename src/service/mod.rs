//! Services: one per resource, each a set of async functions over `&PgPool`.

mod catalog;
mod comments;
mod reviews;
mod signup;
mod titles;
mod users;
mod validation;

pub use catalog::{TagInput, TagKind, TagService};
pub use comments::{CommentInput, CommentService};
pub use reviews::{ReviewInput, ReviewService};
pub use signup::{SignupInput, SignupResponse, SignupService, TokenInput, TokenResponse};
pub use titles::{TitleFilters, TitleInput, TitleService};
pub use users::{UserInput, UserService};
pub use validation::{current_year, Validator};

use crate::error::AppError;
use crate::response::PageRequest;
use crate::sql::{query_as, query_scalar, ListQuery};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

/// One page of rows plus the total row count and the resolved page.
pub struct Listing<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: PageRequest,
}

impl<T> Listing<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
        }
    }
}

/// Count matching rows, reject out-of-range pages, then fetch the page.
pub(crate) async fn fetch_page<T>(pool: &PgPool, q: &ListQuery, page: PageRequest) -> Result<Listing<T>, AppError>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let count_q = q.count();
    let count: i64 = query_scalar::<i64>(&count_q).fetch_one(pool).await?;
    let count = count.max(0) as u64;
    let page = page.clamp_to(count)?;
    let page_q = q.page(page.limit(), page.offset());
    let items = query_as::<T>(&page_q).fetch_all(pool).await?;
    Ok(Listing { items, count, page })
}

//! Builds parameterized list queries: fixed SELECT/FROM text from the services,
//! filter values only as `$n` parameters.

use super::params::PgBindValue;
use sqlx::postgres::{PgArguments, PgRow, Postgres};

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

/// A filtered, ordered list query that can be rendered as a page or as a count.
pub struct ListQuery {
    select: String,
    from: String,
    order_by: String,
    conditions: Vec<String>,
    params: Vec<PgBindValue>,
}

impl ListQuery {
    pub fn new(select: impl Into<String>, from: impl Into<String>, order_by: impl Into<String>) -> Self {
        ListQuery {
            select: select.into(),
            from: from.into(),
            order_by: order_by.into(),
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }

    /// Add a condition; `render` receives the placeholder number for `value`.
    pub fn where_with(&mut self, value: impl Into<PgBindValue>, render: impl FnOnce(u32) -> String) -> &mut Self {
        let n = self.push_param(value.into());
        self.conditions.push(render(n));
        self
    }

    /// `expr = $n`
    pub fn where_eq(&mut self, expr: &str, value: impl Into<PgBindValue>) -> &mut Self {
        self.where_with(value, |n| format!("{} = ${}", expr, n))
    }

    /// Case-insensitive substring match on `expr`.
    pub fn where_contains(&mut self, expr: &str, term: &str) -> &mut Self {
        let pattern = format!("%{}%", escape_like(term));
        self.where_with(pattern, |n| format!("{} ILIKE ${}", expr, n))
    }

    fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// SELECT with ORDER BY, LIMIT and OFFSET.
    pub fn page(&self, limit: u32, offset: u64) -> QueryBuf {
        let mut params = self.params.clone();
        params.push(PgBindValue::I64(limit as i64));
        let limit_ph = params.len();
        params.push(PgBindValue::I64(offset as i64));
        let offset_ph = params.len();
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} LIMIT ${} OFFSET ${}",
            self.select,
            self.from,
            self.where_sql(),
            self.order_by,
            limit_ph,
            offset_ph
        );
        QueryBuf { sql, params }
    }

    /// COUNT(*) over the same FROM and WHERE.
    pub fn count(&self) -> QueryBuf {
        QueryBuf {
            sql: format!("SELECT COUNT(*) FROM {}{}", self.from, self.where_sql()),
            params: self.params.clone(),
        }
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Prepare a typed query with all of `q`'s parameters bound in order.
pub fn query_as<T>(q: &QueryBuf) -> sqlx::query::QueryAs<'_, Postgres, T, PgArguments>
where
    T: for<'r> sqlx::FromRow<'r, PgRow>,
{
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_as::<_, T>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

/// Prepare a single-column query (e.g. COUNT) with all of `q`'s parameters bound.
pub fn query_scalar<T>(q: &QueryBuf) -> sqlx::query::QueryScalar<'_, Postgres, T, PgArguments>
where
    (T,): for<'r> sqlx::FromRow<'r, PgRow>,
{
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_scalar::<_, T>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_appends_limit_and_offset_after_filters() {
        let mut q = ListQuery::new("t.id, t.name", "titles t", "t.name, t.id");
        q.where_eq("t.year", 1999i64).where_contains("t.name", "matrix");
        let page = q.page(10, 20);
        assert_eq!(
            page.sql,
            "SELECT t.id, t.name FROM titles t WHERE t.year = $1 AND t.name ILIKE $2 ORDER BY t.name, t.id LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            page.params,
            vec![
                PgBindValue::I64(1999),
                PgBindValue::String("%matrix%".into()),
                PgBindValue::I64(10),
                PgBindValue::I64(20),
            ]
        );
    }

    #[test]
    fn count_shares_conditions_without_paging() {
        let mut q = ListQuery::new("t.id", "titles t", "t.id");
        q.where_with("drama", |n| format!("EXISTS (SELECT 1 FROM genres g WHERE g.slug = ${})", n));
        let count = q.count();
        assert_eq!(
            count.sql,
            "SELECT COUNT(*) FROM titles t WHERE EXISTS (SELECT 1 FROM genres g WHERE g.slug = $1)"
        );
        assert_eq!(count.params.len(), 1);
        assert!(q.page(5, 0).sql.ends_with("ORDER BY t.id LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn unfiltered_query_has_no_where() {
        let q = ListQuery::new("*", "genres", "name");
        assert_eq!(q.count().sql, "SELECT COUNT(*) FROM genres");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}

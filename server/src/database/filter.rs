//! Parameterized `WHERE` builder and paged listing.
//!
//! Column names come from code, never from the request. Every request value
//! is bound as a parameter.

use shared::types::PageRequest;
use sqlx::SqliteConnection;
use tracing::debug;

use super::descriptor::{Record, SqlValue, bind_value};
use super::error::{DbError, DbResult};
use super::mapper::{count_where, primary_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joiner {
    And,
    Or,
}

impl Joiner {
    fn separator(self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
        }
    }
}

/// A flat list of predicates joined by one operator. Nested groups carry
/// their own operator.
#[derive(Debug, Clone)]
pub struct Filter {
    joiner: Joiner,
    clauses: Vec<String>,
    params: Vec<SqlValue>,
}

impl Filter {
    /// Predicates joined with `AND`.
    pub fn all() -> Self {
        Self {
            joiner: Joiner::And,
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Predicates joined with `OR`.
    pub fn any() -> Self {
        Self {
            joiner: Joiner::Or,
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(value.into());
        self
    }

    /// One `column = ?` predicate per value.
    pub fn eq_each<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        for value in values {
            self = self.eq(column, value);
        }
        self
    }

    /// Substring match. `%` and `_` in `needle` match literally.
    pub fn like(mut self, column: &str, needle: &str) -> Self {
        self.clauses.push(format!("{} LIKE ? ESCAPE '\\'", column));
        self.params
            .push(SqlValue::Text(format!("%{}%", escape_like(needle))));
        self
    }

    pub fn like_each<'a, I>(mut self, column: &str, needles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for needle in needles {
            self = self.like(column, needle);
        }
        self
    }

    /// Add `inner` as a parenthesized group. Empty groups are dropped.
    pub fn group(mut self, inner: Filter) -> Self {
        if inner.is_empty() {
            return self;
        }
        self.clauses.push(format!("({})", inner.joined()));
        self.params.extend(inner.params);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// ` WHERE ...` with a leading space, or empty when there are no
    /// predicates.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.joined())
        }
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    fn joined(&self) -> String {
        self.clauses.join(self.joiner.separator())
    }
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Count every row matching `filter`, then fetch one page of them ordered by
/// primary key. Both statements share the same `WHERE`.
pub async fn list_page<R: Record>(
    conn: &mut SqliteConnection,
    filter: &Filter,
    page: PageRequest,
) -> DbResult<(i64, Vec<R>)> {
    let pk = primary_key::<R>()?;
    let where_clause = filter.where_clause();

    let total = count_where::<R>(conn, &where_clause, filter.params()).await?;

    let sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT ? OFFSET ?",
        R::select_list(),
        R::source(),
        where_clause,
        pk.column
    );

    let mut query = sqlx::query(&sql);
    for value in filter.params() {
        query = bind_value(query, value.clone());
    }
    let rows = query
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    debug!(
        table = R::TABLE,
        total,
        returned = rows.len(),
        page = page.page,
        "listed page"
    );

    let items = rows
        .iter()
        .map(|row| R::from_row(row).map_err(DbError::from))
        .collect::<DbResult<Vec<R>>>()?;

    Ok((total, items))
}

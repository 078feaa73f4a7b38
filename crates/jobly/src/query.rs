//! Execution of pre-numbered SQL (`$1, $2, ...`) with ordered parameters.

use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::fragment::Fragment;
use crate::row::FromRow;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// SQL longer than this (in bytes) is truncated in log events.
const MAX_LOGGED_SQL: usize = 200;

/// A statement with its bound parameters.
///
/// # Example
///
/// ```ignore
/// use jobly::query;
///
/// let company: Company = query("SELECT * FROM companies WHERE handle = $1")
///     .tag("companies.get")
///     .bind("c1".to_string())
///     .fetch_one_as(&conn)
///     .await?;
/// ```
pub struct Query {
    sql: String,
    params: Vec<Box<dyn ToSql + Sync + Send>>,
    tag: Option<&'static str>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
        tag: None,
    }
}

impl Query {
    /// Associate a tag, reported in `jobly.sql` log events.
    pub fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Bind a parameter to the query
    pub fn bind<T: ToSql + Sync + Send + 'static>(mut self, value: T) -> Self {
        self.params.push(Box::new(value));
        self
    }

    /// Bind every value of a fragment, in placeholder order.
    ///
    /// The fragment's SQL must already be part of this query's text.
    pub fn bind_fragment(mut self, fragment: Fragment) -> Self {
        let (_, values) = fragment.into_parts();
        self.params
            .extend(values.into_iter().map(|v| Box::new(v) as Box<dyn ToSql + Sync + Send>));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref() as _).collect()
    }

    fn trace(&self) {
        let sql = truncate_sql_bytes(&self.sql, MAX_LOGGED_SQL);
        tracing::debug!(
            target: "jobly.sql",
            tag = self.tag.unwrap_or("-"),
            param_count = self.params.len(),
            truncated = sql.len() < self.sql.len(),
            sql = %sql,
        );
    }

    /// Execute the query and return all rows
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        self.trace();
        conn.query(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return all rows mapped to type T
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the query and return the first row mapped to type T.
    ///
    /// Returns `JoblyError::NotFound` if no rows are returned.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        self.trace();
        let row = conn.query_one(&self.sql, &self.params_ref()).await?;
        T::from_row(&row)
    }

    /// Execute the query and return at most one row
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        self.trace();
        conn.query_opt(&self.sql, &self.params_ref()).await
    }

    /// Execute the query and return at most one row mapped to type T
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the query and return the number of affected rows
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        self.trace();
        conn.execute(&self.sql, &self.params_ref()).await
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

//! Repository layer for database operations
//!
//! Every domain adds its methods to [`Repository`] from its own file, with the
//! domain name as method prefix (`assets_get_by_id`, `issues_return`, ...).

pub mod assets;
pub mod audit;
pub mod categories;
pub mod departments;
pub mod issues;
pub mod maintenance;
pub mod profiles;
pub mod reports;
pub mod requests;

use sqlx::{
    postgres::PgArguments,
    query::{Query, QueryAs, QueryScalar},
    Pool, Postgres,
};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Round-trip to the database (readiness probe)
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Repository whose pool never connects; queries fail fast
    #[cfg(test)]
    pub(crate) fn offline() -> Self {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        Self::new(pool)
    }
}

/// WHERE clause builder with positional text parameters.
///
/// Conditions are ANDed. Every value is bound as TEXT, so columns of other
/// types must cast the placeholder (`$n::date`).
#[derive(Debug, Default)]
pub(crate) struct Filters {
    conditions: Vec<String>,
    params: Vec<String>,
}

impl Filters {
    /// Register a parameter and return its placeholder
    pub fn param(&mut self, value: impl ToString) -> String {
        self.params.push(value.to_string());
        format!("${}", self.params.len())
    }

    pub fn raw(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    pub fn eq(&mut self, column: &str, value: impl ToString) {
        let p = self.param(value);
        self.conditions.push(format!("{} = {}", column, p));
    }

    /// Case-insensitive equality
    pub fn ieq(&mut self, column: &str, value: &str) {
        let p = self.param(value.trim());
        self.conditions.push(format!("LOWER({}) = LOWER({})", column, p));
    }

    /// Case-insensitive substring match over any of `columns`; blank terms are ignored
    pub fn search(&mut self, columns: &[&str], term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let p = self.param(format!("%{}%", term.to_lowercase()));
        let any = columns
            .iter()
            .map(|c| format!("LOWER(COALESCE({}, '')) LIKE {}", c, p))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({})", any));
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    /// Number of placeholders used so far
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn bind_query<'q>(
        &'q self,
        mut query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        for p in &self.params {
            query = query.bind(p);
        }
        query
    }

    pub fn bind_as<'q, O>(
        &'q self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for p in &self.params {
            query = query.bind(p);
        }
        query
    }

    pub fn bind_scalar<'q, O>(
        &'q self,
        mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for p in &self.params {
            query = query.bind(p);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters_match_everything() {
        assert_eq!(Filters::default().where_clause(), "TRUE");
    }

    #[test]
    fn test_placeholders_are_numbered_in_order() {
        let mut f = Filters::default();
        f.eq("a.status", "available");
        f.search(&["a.name", "a.asset_code"], " Proj ");
        f.ieq("a.category", "Laptop");
        assert_eq!(f.len(), 3);
        assert_eq!(
            f.where_clause(),
            "a.status = $1 AND (LOWER(COALESCE(a.name, '')) LIKE $2 OR LOWER(COALESCE(a.asset_code, '')) LIKE $2) AND LOWER(a.category) = LOWER($3)"
        );
        assert_eq!(f.params, vec!["available", "%proj%", "Laptop"]);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut f = Filters::default();
        f.search(&["name"], "   ");
        assert_eq!(f.len(), 0);
    }
}

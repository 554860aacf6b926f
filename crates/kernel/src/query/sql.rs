//! PostgreSQL rendering of a [`QueryDescriptor`] using SeaQuery.
//!
//! Items live in one table:
//!
//! ```sql
//! CREATE TABLE cms_content (
//!     id TEXT PRIMARY KEY,
//!     content_type TEXT NOT NULL,
//!     data JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! Field names and search text are always bound as parameters. The
//! predicates mirror [`apply_to_in_memory_set`](super::in_memory::apply_to_in_memory_set):
//! arrays are searched and filtered element-wise, text sorts use byte order
//! and missing values sort first ascending. Date-only strings in `data` are
//! read in the session time zone, so sessions should run in UTC.

use sea_query::{
    Alias, Asterisk, Cond, Expr, ExprTrait, NullOrdering, Order, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr, Values,
};

use tessera_schema::types::SortDirection;

use super::types::{FieldFilter, QueryDescriptor, SearchSpec, SearchTarget, SortKey, SortOrder};

/// Default table holding content items.
pub const CONTENT_TABLE: &str = "cms_content";

const COLUMNS: [&str; 5] = ["id", "content_type", "data", "created_at", "updated_at"];

/// Builds SELECT and COUNT statements for a query descriptor.
pub struct SqlQueryBuilder {
    query: QueryDescriptor,
    table: String,
}

impl SqlQueryBuilder {
    pub fn new(query: QueryDescriptor) -> Self {
        Self {
            query,
            table: CONTENT_TABLE.to_string(),
        }
    }

    /// Target a different table with the same columns.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Parameterized page query. `page` is 1-based.
    pub fn build(&self, page: u32, per_page: u32) -> (String, Values) {
        self.select(page, per_page).build(PostgresQueryBuilder)
    }

    /// Parameterized count of all matching rows.
    pub fn build_count(&self) -> (String, Values) {
        self.count().build(PostgresQueryBuilder)
    }

    /// Page query with values inlined, for logs and tests.
    pub fn to_sql(&self, page: u32, per_page: u32) -> String {
        self.select(page, per_page).to_string(PostgresQueryBuilder)
    }

    /// Count query with values inlined.
    pub fn count_sql(&self) -> String {
        self.count().to_string(PostgresQueryBuilder)
    }

    fn select(&self, page: u32, per_page: u32) -> SelectStatement {
        let mut query = Query::select();
        for column in COLUMNS {
            query.column((Alias::new(&self.table), Alias::new(column)));
        }
        query.from(Alias::new(&self.table));
        self.add_conditions(&mut query);
        self.add_sort(&mut query);

        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        query.limit(u64::from(per_page));
        query.offset(offset);
        query
    }

    fn count(&self) -> SelectStatement {
        let mut query = Query::select();
        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(&self.table));
        self.add_conditions(&mut query);
        query
    }

    fn column(&self, name: &str) -> SimpleExpr {
        Expr::col((Alias::new(&self.table), Alias::new(name))).into()
    }

    fn add_conditions(&self, query: &mut SelectStatement) {
        query.and_where(
            self.column("content_type")
                .eq(self.query.content_type.as_str()),
        );

        if let Some(after) = self.query.created.after {
            query.and_where(self.column("created_at").gte(after));
        }
        if let Some(before) = self.query.created.before {
            query.and_where(self.column("created_at").lte(before));
        }

        if let Some(search) = &self.query.search {
            query.and_where(search_condition(search));
        }

        for filter in &self.query.filters {
            query.and_where(filter_condition(filter));
        }
    }

    fn add_sort(&self, query: &mut SelectStatement) {
        let sort = &self.query.sort;
        let (order, nulls) = match sort.direction {
            SortDirection::Asc => (Order::Asc, NullOrdering::First),
            SortDirection::Desc => (Order::Desc, NullOrdering::Last),
        };

        match &sort.key {
            SortKey::CreatedAt => {
                query.order_by((Alias::new(&self.table), Alias::new("created_at")), order);
            }
            SortKey::UpdatedAt => {
                query.order_by((Alias::new(&self.table), Alias::new("updated_at")), order);
            }
            SortKey::Field { name, order: kind } => {
                query.order_by_expr_with_nulls(sort_expr(name, *kind), order, nulls);
            }
        }
    }
}

/// Any target containing the needle, case-insensitively.
fn search_condition(search: &SearchSpec) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like_wildcards(&search.needle));
    let mut any = Cond::any();
    for target in &search.targets {
        any = any.add(match target {
            SearchTarget::Id => {
                Expr::cust_with_values("CAST(id AS text) ILIKE $1", [pattern.clone()])
            }
            SearchTarget::Field(name) => Expr::cust_with_values(
                "CASE jsonb_typeof(data -> CAST($1 AS text)) \
                 WHEN 'array' THEN EXISTS (\
                 SELECT 1 FROM jsonb_array_elements(data -> CAST($1 AS text)) AS e(v) \
                 WHERE jsonb_typeof(e.v) IN ('string', 'number') AND (e.v #>> '{}') ILIKE $2) \
                 WHEN 'string' THEN (data ->> CAST($1 AS text)) ILIKE $2 \
                 WHEN 'number' THEN (data ->> CAST($1 AS text)) ILIKE $2 \
                 ELSE FALSE END",
                [name.clone(), pattern.clone()],
            ),
        });
    }
    any.into()
}

/// Scalars compare by text form; arrays match on any scalar element.
fn filter_condition(filter: &FieldFilter) -> SimpleExpr {
    Expr::cust_with_values(
        "CASE jsonb_typeof(data -> CAST($1 AS text)) \
         WHEN 'array' THEN EXISTS (\
         SELECT 1 FROM jsonb_array_elements(data -> CAST($1 AS text)) AS e(v) \
         WHERE jsonb_typeof(e.v) IN ('string', 'number', 'boolean') AND (e.v #>> '{}') = $2) \
         WHEN 'object' THEN FALSE \
         WHEN 'null' THEN FALSE \
         ELSE (data ->> CAST($1 AS text)) = $2 END",
        [filter.field.clone(), filter.value.clone()],
    )
}

/// Sort value of a data key; NULL when the stored value has the wrong JSON type.
fn sort_expr(field: &str, order: SortOrder) -> SimpleExpr {
    let sql = match order {
        SortOrder::Text => {
            "(CASE WHEN jsonb_typeof(data -> CAST($1 AS text)) IN ('string', 'number', 'boolean') \
             THEN data ->> CAST($1 AS text) END) COLLATE \"C\""
        }
        SortOrder::Numeric => {
            "CASE WHEN jsonb_typeof(data -> CAST($1 AS text)) = 'number' \
             THEN CAST(data ->> CAST($1 AS text) AS numeric) END"
        }
        SortOrder::Chronological => {
            "CASE WHEN jsonb_typeof(data -> CAST($1 AS text)) = 'string' \
             AND (data ->> CAST($1 AS text)) ~ '^[0-9]{4}-[0-9]{2}-[0-9]{2}' \
             THEN CAST(data ->> CAST($1 AS text) AS timestamptz) END"
        }
        SortOrder::Boolean => {
            "CASE WHEN jsonb_typeof(data -> CAST($1 AS text)) = 'boolean' \
             THEN CAST(data ->> CAST($1 AS text) AS boolean) END"
        }
    };
    Expr::cust_with_values(sql, [field.to_string()])
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

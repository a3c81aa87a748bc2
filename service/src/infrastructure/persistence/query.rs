use std::borrow::Cow;

use crate::infrastructure::persistence::parameters::SqlParameter;
use crate::infrastructure::persistence::schema::{Column, ColumnRef, Table};

/// Composable SELECT builder.
///
/// [`QueryBuilder::build`] and [`QueryBuilder::build_count`] render the same
/// FROM, JOIN and WHERE clauses, so a count and the page it describes always
/// agree on the filter.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    from_table: Table<'a>,
    select: Vec<ColumnRef<'a>>,
    where_conditions: Vec<Condition<'a>>,
    order_by: Vec<ColumnRef<'a>>,
    limit: Option<i64>,
    offset: Option<i64>,
    joins: Vec<Join<'a>>,
}

/// A where condition that will be AND'ed together
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<'a> {
    /// field = value
    Equals {
        column: ColumnRef<'a>,
        value: SqlParameter,
    },

    /// field LIKE '%value%', wildcards in value are not escaped
    Contains { column: ColumnRef<'a>, value: String },

    /// field IS NULL
    IsNull { column: ColumnRef<'a> },

    /// strftime(format, field) = value
    Strftime {
        format: &'static str,
        column: ColumnRef<'a>,
        value: String,
    },
}

/// LEFT JOIN target ON main = target
#[derive(Debug, Clone)]
pub struct Join<'a> {
    pub target_table: Table<'a>,
    pub main_column: ColumnRef<'a>,
    pub target_column: ColumnRef<'a>,
}

impl<'a> From<Table<'a>> for QueryBuilder<'a> {
    fn from(value: Table<'a>) -> Self {
        QueryBuilder {
            from_table: value,
            select: vec![],
            where_conditions: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            joins: vec![],
        }
    }
}

impl<'a> QueryBuilder<'a> {
    /// Select specified columns
    pub fn select(mut self, columns: &'a [Column<'a>]) -> Self {
        self.select = columns.iter().map(Cow::Borrowed).collect();
        self
    }

    pub fn left_join(mut self, table: Table<'a>, main: &'a Column<'a>, target: &'a Column<'a>) -> Self {
        self.joins.push(Join {
            target_table: table,
            main_column: Cow::Borrowed(main),
            target_column: Cow::Borrowed(target),
        });
        self
    }

    /// Add where condition
    pub fn where_condition(mut self, condition: Condition<'a>) -> Self {
        self.where_conditions.push(condition);
        self
    }

    pub fn where_conditions(mut self, conditions: impl IntoIterator<Item = Condition<'a>>) -> Self {
        self.where_conditions.extend(conditions);
        self
    }

    /// Newest first, the only order the lists need
    pub fn order_by_desc(mut self, column: &'a Column<'a>) -> Self {
        self.order_by.push(Cow::Borrowed(column));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SQL query string
    pub fn build(&self) -> (String, Vec<SqlParameter>) {
        let mut sql = String::new();

        // SELECT clause
        sql.push_str("SELECT ");
        let columns = self
            .select
            .iter()
            .map(|c| c.selected())
            .collect::<Vec<_>>();
        sql.push_str(&columns.join(", "));

        let params = self.push_from_and_where(&mut sql);

        // ORDER BY clause
        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|column| format!("{} DESC", column.qualified()))
                .collect();
            sql.push_str(&order_clauses.join(", "));
        }

        // LIMIT clause
        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {}", limit));
        }
        // OFFSET clause
        if let Some(offset) = self.offset {
            sql.push_str(&format!("\nOFFSET {}", offset));
        }

        (sql, params)
    }

    /// Build `SELECT COUNT(*)` over the same rows, ignoring select list,
    /// ordering and paging
    pub fn build_count(&self) -> (String, Vec<SqlParameter>) {
        let mut sql = String::from("SELECT COUNT(*)");
        let params = self.push_from_and_where(&mut sql);
        (sql, params)
    }

    fn push_from_and_where(&self, sql: &mut String) -> Vec<SqlParameter> {
        // FROM clause
        sql.push_str(&format!("\nFROM {}", self.from_table.qualified()));

        // JOIN clauses
        for join in &self.joins {
            sql.push_str(&format!(
                "\nLEFT JOIN {} ON {} = {}",
                join.target_table.qualified(),
                join.main_column.qualified(),
                join.target_column.qualified()
            ));
        }

        // WHERE clause
        let mut params = Vec::new();
        if !self.where_conditions.is_empty() {
            let where_sql = self
                .where_conditions
                .iter()
                .map(|condition| condition.to_sql(&mut params))
                .collect::<Vec<_>>();
            sql.push_str("\nWHERE ");
            sql.push_str(&where_sql.join(" AND "));
        }
        params
    }
}

impl Condition<'_> {
    /// Renders the condition with `?` placeholders, pushing bound values in
    /// placeholder order
    pub fn to_sql(&self, params: &mut Vec<SqlParameter>) -> String {
        match self {
            Condition::Equals { column, value } => {
                params.push(value.clone());
                format!("{} = ?", column.qualified())
            }

            Condition::Contains { column, value } => {
                params.push(SqlParameter::Text(format!("%{}%", value)));
                format!("{} LIKE ?", column.qualified())
            }

            Condition::IsNull { column } => format!("{} IS NULL", column.qualified()),

            Condition::Strftime {
                format,
                column,
                value,
            } => {
                params.push(SqlParameter::Text(value.clone()));
                format!("strftime('{}', {}) = ?", format, column.qualified())
            }
        }
    }
}

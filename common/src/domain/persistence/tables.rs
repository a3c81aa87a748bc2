use std::fmt::{Display, Formatter};

/// Represents table in a database, used for ddl generation
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    pub indexes: Vec<Index>,
}

/// Represents one column in the database table
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

/// Represents Column types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

/// Represents foreign key constraint in the database table.
/// Deleting the referenced row sets the column to NULL.
#[derive(Debug, Clone)]
pub struct ForeignKeyConstraint {
    pub column_name: String,
    pub referenced_table_name: String,
    pub referenced_column_name: String,
}

/// Represents an index in the database table
#[derive(Debug, Clone)]
pub struct Index {
    pub table_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Table {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key<T: Into<String>>(
        mut self,
        column_name: T,
        referenced_table_name: T,
    ) -> Self {
        self.foreign_keys.push(ForeignKeyConstraint {
            column_name: column_name.into(),
            referenced_table_name: referenced_table_name.into(),
            referenced_column_name: crate::ID_FIELD_NAME.to_string(),
        });
        self
    }

    pub fn index(mut self, columns: &[&str], unique: bool) -> Self {
        self.indexes.push(Index {
            table_name: self.name.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        });
        self
    }

    /// CREATE TABLE followed by its indexes
    pub fn create_ddls(&self) -> Vec<String> {
        let mut definitions: Vec<String> = self.columns.iter().map(Column::ddl).collect();

        for fk in self.foreign_keys.iter() {
            definitions.push(fk.ddl());
        }

        let table_ddl = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n    {}\n)",
            self.name,
            definitions.join(",\n    ")
        );

        let mut ddls = vec![table_ddl];
        for index in self.indexes.iter() {
            ddls.push(index.ddl());
        }
        ddls
    }
}

impl Column {
    pub fn new<T: Into<String>>(name: T, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            not_null: false,
            unique: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key<T: Into<String>>(name: T) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, ColumnType::Integer)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value<T: Into<String>>(mut self, value: T) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// ALTER TABLE ... ADD COLUMN only accepts columns that existing rows can take
    pub fn can_be_added(&self) -> bool {
        !self.primary_key && !self.unique && (!self.not_null || self.default_value.is_some())
    }

    /// Defaults SQLite evaluates per row, e.g. `CURRENT_TIMESTAMP`
    pub fn has_computed_default(&self) -> bool {
        self.default_value.as_deref().is_some_and(|value| {
            let value = value.trim().to_ascii_uppercase();
            value.starts_with("CURRENT_") || value.starts_with('(')
        })
    }

    /// Statements appending this column to an existing table.
    ///
    /// SQLite refuses `ADD COLUMN` with a computed default once the table has
    /// rows. Such a column is added nullable, existing rows are backfilled and
    /// a trigger fills it in for rows inserted later.
    pub fn add_ddls(&self, table_name: &str) -> Vec<String> {
        let Some(default_value) = self
            .default_value
            .as_deref()
            .filter(|_| self.has_computed_default())
        else {
            return vec![format!("ALTER TABLE \"{}\" ADD COLUMN {}", table_name, self.ddl())];
        };

        let name = &self.name;
        vec![
            format!("ALTER TABLE \"{table_name}\" ADD COLUMN \"{name}\" {}", self.column_type),
            format!(
                "UPDATE \"{table_name}\" SET \"{name}\" = {default_value} WHERE \"{name}\" IS NULL"
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS \"{table_name}_{name}_default\" \
                 AFTER INSERT ON \"{table_name}\" FOR EACH ROW WHEN NEW.\"{name}\" IS NULL \
                 BEGIN UPDATE \"{table_name}\" SET \"{name}\" = {default_value} \
                 WHERE rowid = NEW.rowid; END"
            ),
        ]
    }

    pub fn ddl(&self) -> String {
        if self.primary_key {
            return format!("\"{}\" INTEGER PRIMARY KEY AUTOINCREMENT", self.name);
        }

        let mut sql = format!("\"{}\" {}", self.name, self.column_type);
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default_value) = &self.default_value {
            sql.push_str(format!(" DEFAULT {}", default_value).as_str());
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Text => f.write_str("TEXT"),
        }
    }
}

impl ForeignKeyConstraint {
    fn ddl(&self) -> String {
        format!(
            "FOREIGN KEY (\"{}\") REFERENCES \"{}\" (\"{}\") ON DELETE SET NULL",
            self.column_name, self.referenced_table_name, self.referenced_column_name
        )
    }
}

impl Index {
    fn ddl(&self) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS \"{}_{}_idx\" ON \"{}\" ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.table_name,
            self.columns.join("_"),
            self.table_name,
            self.columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_table_with_foreign_key_and_index() {
        let table = Table::new("documents")
            .column(Column::primary_key("id"))
            .column(Column::new("title", ColumnType::Text).not_null())
            .column(Column::new("handler_id", ColumnType::Integer))
            .foreign_key("handler_id", "users")
            .index(&["handler_id"], false);

        let ddls = table.create_ddls();
        assert_eq!(ddls.len(), 2);
        assert!(ddls[0].contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddls[0].contains("\"title\" TEXT NOT NULL"));
        assert!(ddls[0].contains(
            "FOREIGN KEY (\"handler_id\") REFERENCES \"users\" (\"id\") ON DELETE SET NULL"
        ));
        assert_eq!(
            ddls[1],
            "CREATE INDEX IF NOT EXISTS \"documents_handler_id_idx\" ON \"documents\" (\"handler_id\")"
        );
    }

    #[test]
    fn only_relaxed_columns_can_be_added() {
        assert!(Column::new("notes", ColumnType::Text).can_be_added());
        assert!(
            Column::new("status", ColumnType::Text)
                .not_null()
                .default_value("'unassigned'")
                .can_be_added()
        );
        assert!(!Column::new("title", ColumnType::Text).not_null().can_be_added());
        assert!(!Column::primary_key("id").can_be_added());
    }

    #[test]
    fn constant_default_is_added_in_one_statement() {
        let column = Column::new("role", ColumnType::Text)
            .not_null()
            .default_value("'staff'");
        assert!(!column.has_computed_default());
        assert_eq!(
            column.add_ddls("users"),
            vec!["ALTER TABLE \"users\" ADD COLUMN \"role\" TEXT NOT NULL DEFAULT 'staff'"]
        );
    }

    #[test]
    fn computed_default_is_backfilled() {
        let column = Column::new("created_at", ColumnType::Text)
            .not_null()
            .default_value("CURRENT_TIMESTAMP");
        assert!(column.has_computed_default());

        let ddls = column.add_ddls("users");
        assert_eq!(ddls.len(), 3);
        assert_eq!(ddls[0], "ALTER TABLE \"users\" ADD COLUMN \"created_at\" TEXT");
        assert_eq!(
            ddls[1],
            "UPDATE \"users\" SET \"created_at\" = CURRENT_TIMESTAMP WHERE \"created_at\" IS NULL"
        );
        assert!(ddls[2].starts_with("CREATE TRIGGER IF NOT EXISTS \"users_created_at_default\""));
    }
}

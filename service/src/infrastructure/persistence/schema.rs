use std::borrow::Cow;

// Represents a table in database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    pub name: &'a str,
    pub alias: &'static str,
}

impl Table<'_> {
    /// Get qualified table name with alias
    pub fn qualified(&self) -> String {
        format!("\"{}\" AS \"{}\"", self.name, self.alias)
    }
}

/// Represents one column in the database table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column<'a> {
    pub qualifier: &'static str,
    pub name: &'a str,
    /// Name in the result row when it differs from `name`
    pub alias: Option<&'static str>,
}

impl<'a> Column<'a> {
    pub const fn new(qualifier: &'static str, name: &'a str) -> Self {
        Self {
            qualifier,
            name,
            alias: None,
        }
    }

    pub const fn aliased(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Get qualified column name
    pub fn qualified(&self) -> String {
        format!("\"{}\".\"{}\"", self.qualifier, self.name)
    }

    /// Qualified name for the select list
    pub fn selected(&self) -> String {
        match self.alias {
            Some(alias) => format!("{} AS \"{}\"", self.qualified(), alias),
            None => self.qualified(),
        }
    }
}

/// Column reference which can be either borrowed or owned
pub type ColumnRef<'a> = Cow<'a, Column<'a>>;

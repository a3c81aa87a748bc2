use sqlx::Arguments;
use sqlx::error::BoxDynError;
use sqlx::sqlite::SqliteArguments;

// SQL parameter that will be bound to query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParameter {
    Text(String),
    Integer(i64),
    Null,
}

impl From<&str> for SqlParameter {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParameter {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParameter {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<SqlParameter>> From<Option<T>> for SqlParameter {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Moves the parameters, in placeholder order, into sqlx arguments
pub fn into_arguments<'q>(parameters: Vec<SqlParameter>) -> Result<SqliteArguments<'q>, BoxDynError> {
    let mut args = SqliteArguments::default();
    for parameter in parameters {
        match parameter {
            SqlParameter::Text(value) => args.add(value)?,
            SqlParameter::Integer(value) => args.add(value)?,
            SqlParameter::Null => args.add(None::<String>)?,
        }
    }
    Ok(args)
}

//! INSERT / REPLACE statement builder.
//!
//! # Example
//! ```ignore
//! use sqlbind::{InsertBuilder, SqlBuilder, raw};
//! use sqlbind::dialect::MYSQL;
//!
//! let stmt = InsertBuilder::insert(MYSQL, "user")
//!     .columns(["username", "age", "create_at"])
//!     .values(["new user".into(), 18.into(), raw("UNIX_TIMESTAMP(NOW())")])
//!     .option("ON DUPLICATE KEY UPDATE age = VALUES(age)")
//!     .build()?;
//! ```

use crate::dialect::{Dialect, DialectSpec};
use crate::error::{BindError, BindResult};
use crate::input::{Input, Normalizer, RowSet};
use crate::value::{JsonTime, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// One argument position of a VALUES row.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Bound through a placeholder.
    Value(Value),
    /// Spliced into the statement text verbatim.
    Raw(String),
}

/// Mark a SQL fragment to be spliced verbatim instead of parameterized.
pub fn raw(sql: impl Into<String>) -> Arg {
    Arg::Raw(sql.into())
}

macro_rules! arg_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(v.into())
                }
            }
        )*
    };
}

arg_from!(
    Value, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &str,
    Vec<u8>, NaiveDateTime, DateTime<Utc>, JsonTime
);

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Value(v.into())
    }
}

/// A rendered statement and its ordered arguments.
///
/// The number of placeholders in `sql` equals `args.len()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Statement keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Insert,
    Replace,
}

impl InsertMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            InsertMode::Insert => "INSERT",
            InsertMode::Replace => "REPLACE",
        }
    }
}

/// Base trait for statement builders.
pub trait SqlBuilder {
    /// Render the statement text and its arguments.
    fn build(&self) -> BindResult<Statement>;

    /// Guard against statements that would affect every row.
    ///
    /// Callers invoke this uniformly before execution. INSERT and REPLACE
    /// carry no predicate, so they always pass.
    fn safety(&self) -> BindResult<()> {
        Ok(())
    }
}

/// A VALUES row whose width differs from the column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WidthMismatch {
    row: usize,
    expected: usize,
    got: usize,
}

impl From<WidthMismatch> for BindError {
    fn from(m: WidthMismatch) -> Self {
        BindError::ArgCountMismatch {
            row: m.row,
            expected: m.expected,
            got: m.got,
        }
    }
}

/// INSERT / REPLACE builder.
///
/// Setters chain; the first width error is kept and returned by
/// [`SqlBuilder::build`].
#[derive(Debug, Clone)]
pub struct InsertBuilder<D = DialectSpec> {
    dialect: D,
    table: String,
    mode: InsertMode,
    columns: Vec<String>,
    rows: Vec<Vec<Arg>>,
    options: Vec<String>,
    error: Option<WidthMismatch>,
}

impl<D: Dialect> InsertBuilder<D> {
    pub fn new(dialect: D, table: impl Into<String>, mode: InsertMode) -> Self {
        Self {
            dialect,
            table: table.into(),
            mode,
            columns: Vec::new(),
            rows: Vec::new(),
            options: Vec::new(),
            error: None,
        }
    }

    /// Create an INSERT builder.
    pub fn insert(dialect: D, table: impl Into<String>) -> Self {
        Self::new(dialect, table, InsertMode::Insert)
    }

    /// Create a REPLACE builder.
    pub fn replace(dialect: D, table: impl Into<String>) -> Self {
        Self::new(dialect, table, InsertMode::Replace)
    }

    /// Create a builder from a normalized row set.
    pub fn from_rows(dialect: D, table: impl Into<String>, mode: InsertMode, set: RowSet) -> Self {
        let mut builder = Self::new(dialect, table, mode);
        builder.columns = set.columns;
        builder.rows = set
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Arg::Value).collect())
            .collect();
        builder
    }

    /// Normalize `input` and create a builder from it.
    pub fn from_input(
        dialect: D,
        normalizer: &Normalizer,
        table: impl Into<String>,
        mode: InsertMode,
        input: Input,
    ) -> BindResult<Self> {
        let set = normalizer.normalize(input)?;
        Ok(Self::from_rows(dialect, table, mode, set))
    }

    /// Append columns. Rows added afterwards must match the new width.
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(names.into_iter().map(Into::into));
        self
    }

    /// Append one VALUES row.
    pub fn values<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        if let Err(mismatch) = self.push_row(args) {
            self.error.get_or_insert(mismatch);
        }
        self
    }

    /// Append one VALUES row, reporting a width mismatch immediately.
    pub fn try_values<I>(mut self, args: I) -> BindResult<Self>
    where
        I: IntoIterator<Item = Arg>,
    {
        self.push_row(args)?;
        Ok(self)
    }

    /// Append a raw trailing clause, e.g. `ON CONFLICT (id) DO NOTHING`.
    pub fn option(mut self, clause: impl Into<String>) -> Self {
        self.options.push(clause.into());
        self
    }

    pub fn mode(&self) -> InsertMode {
        self.mode
    }

    pub fn columns_len(&self) -> usize {
        self.columns.len()
    }

    pub fn rows_len(&self) -> usize {
        self.rows.len()
    }

    fn push_row<I>(&mut self, args: I) -> Result<(), WidthMismatch>
    where
        I: IntoIterator<Item = Arg>,
    {
        let row: Vec<Arg> = args.into_iter().collect();
        if row.len() != self.columns.len() {
            return Err(WidthMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    fn validate(&self) -> BindResult<()> {
        if let Some(mismatch) = self.error {
            return Err(mismatch.into());
        }
        if self.rows.is_empty() {
            return Err(BindError::NoData);
        }
        // Columns may have grown after a row was added.
        for (idx, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(WidthMismatch {
                    row: idx,
                    expected: self.columns.len(),
                    got: row.len(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl<D: Dialect> SqlBuilder for InsertBuilder<D> {
    fn build(&self) -> BindResult<Statement> {
        self.validate()?;

        let mut sql = String::with_capacity(64 + self.rows.len() * self.columns.len() * 4);
        sql.push_str(self.mode.keyword());
        sql.push_str(" INTO ");
        sql.push_str(&self.dialect.quote_path(&self.table));
        sql.push_str(" (");
        sql.push_str(&self.dialect.quote_cols(&self.columns).join(", "));
        sql.push_str(") VALUES ");

        let mut args = Vec::with_capacity(self.rows.len() * self.columns.len());
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for (j, arg) in row.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                match arg {
                    Arg::Value(v) => {
                        args.push(v.clone());
                        sql.push_str(&self.dialect.placeholder(args.len()));
                    }
                    Arg::Raw(expr) => sql.push_str(expr),
                }
            }
            sql.push(')');
        }

        for clause in &self.options {
            sql.push(' ');
            sql.push_str(clause);
        }

        tracing::debug!(
            target: "sqlbind",
            dialect = self.dialect.name(),
            mode = self.mode.keyword(),
            rows = self.rows.len(),
            args = args.len(),
            "built statement"
        );

        Ok(Statement { sql, args })
    }
}

/// Build an INSERT statement for `table` from any supported input shape.
pub fn insert<D: Dialect>(
    dialect: D,
    normalizer: &Normalizer,
    table: &str,
    input: impl Into<Input>,
) -> BindResult<Statement> {
    InsertBuilder::from_input(dialect, normalizer, table, InsertMode::Insert, input.into())?.build()
}

/// Build a REPLACE statement for `table` from any supported input shape.
pub fn replace<D: Dialect>(
    dialect: D,
    normalizer: &Normalizer,
    table: &str,
    input: impl Into<Input>,
) -> BindResult<Statement> {
    InsertBuilder::from_input(dialect, normalizer, table, InsertMode::Replace, input.into())?.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MYSQL, POSTGRES, SQLITE};
    use crate::value::ValueMap;

    #[test]
    fn postgres_insert() {
        let stmt = InsertBuilder::insert(POSTGRES, "user")
            .columns(["username", "age"])
            .values(["new user".into(), 18.into()])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "user" ("username", "age") VALUES ($1, $2)"#
        );
        assert_eq!(stmt.args, vec![Value::from("new user"), Value::Int(18)]);
    }

    #[test]
    fn mysql_insert_with_raw_and_option() {
        let stmt = InsertBuilder::insert(MYSQL, "user")
            .columns(["username", "age", "create_at"])
            .values(["new user".into(), 18.into(), raw("UNIX_TIMESTAMP(NOW())")])
            .option("ON DUPLICATE KEY UPDATE age = VALUES(age)")
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `user` (`username`, `age`, `create_at`) VALUES (?, ?, UNIX_TIMESTAMP(NOW())) ON DUPLICATE KEY UPDATE age = VALUES(age)"
        );
        assert_eq!(stmt.args, vec![Value::from("new user"), Value::Int(18)]);
    }

    #[test]
    fn batch_insert_flattens_row_major() {
        let stmt = InsertBuilder::insert(MYSQL, "user")
            .columns(["username", "age"])
            .values(["new user".into(), 18.into()])
            .values(["new user2".into(), 199.into()])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `user` (`username`, `age`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(
            stmt.args,
            vec![
                Value::from("new user"),
                Value::Int(18),
                Value::from("new user2"),
                Value::Int(199)
            ]
        );
    }

    #[test]
    fn replace_changes_only_keyword() {
        let stmt = InsertBuilder::replace(MYSQL, "user")
            .columns(["username", "age"])
            .values(["new user".into(), 18.into()])
            .build()
            .unwrap();
        assert_eq!(stmt.sql, "REPLACE INTO `user` (`username`, `age`) VALUES (?, ?)");
        assert_eq!(stmt.args, vec![Value::from("new user"), Value::Int(18)]);
    }

    #[test]
    fn raw_args_keep_placeholders_dense() {
        let stmt = InsertBuilder::insert(POSTGRES, "t")
            .columns(["a", "b", "c"])
            .values([1.into(), raw("NOW()"), 2.into()])
            .values([raw("DEFAULT"), 3.into(), 4.into()])
            .build()
            .unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "t" ("a", "b", "c") VALUES ($1, NOW(), $2), (DEFAULT, $3, $4)"#
        );
        assert_eq!(stmt.args.len(), 4);
    }

    #[test]
    fn extending_columns_between_rows_fails() {
        let err = InsertBuilder::insert(POSTGRES, "user")
            .columns(["username"])
            .values(["new user".into()])
            .columns(["age"])
            .values([18.into()])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::ArgCountMismatch { row: 1, expected: 2, got: 1 }
        ));
    }

    #[test]
    fn growing_columns_after_rows_fails_at_build() {
        let err = InsertBuilder::insert(MYSQL, "user")
            .columns(["username"])
            .values(["a".into()])
            .columns(["age"])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::ArgCountMismatch { row: 0, expected: 2, got: 1 }
        ));
    }

    #[test]
    fn first_deferred_mismatch_wins() {
        let builder = InsertBuilder::insert(MYSQL, "user")
            .columns(["a", "b"])
            .values([1.into()])
            .values([1.into(), 2.into(), 3.into()]);
        assert_eq!(
            builder.error,
            Some(WidthMismatch { row: 0, expected: 2, got: 1 })
        );
        assert_eq!(
            builder.build().unwrap_err().to_string(),
            BindError::ArgCountMismatch { row: 0, expected: 2, got: 1 }.to_string()
        );
    }

    #[test]
    fn try_values_reports_immediately() {
        let err = InsertBuilder::insert(MYSQL, "user")
            .columns(["a", "b"])
            .try_values([1.into()])
            .unwrap_err();
        assert!(matches!(err, BindError::ArgCountMismatch { row: 0, expected: 2, got: 1 }));
    }

    #[test]
    fn no_rows_is_no_data() {
        let err = InsertBuilder::insert(MYSQL, "user")
            .columns(["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::NoData));
    }

    #[test]
    fn dotted_table_and_sqlite() {
        let stmt = InsertBuilder::insert(SQLITE, "main.user")
            .columns(["name"])
            .values(["x".into()])
            .build()
            .unwrap();
        assert_eq!(stmt.sql, r#"INSERT INTO "main"."user" ("name") VALUES (?)"#);
    }

    #[test]
    fn safety_passes_for_insert() {
        let b = InsertBuilder::insert(MYSQL, "user");
        assert!(b.safety().is_ok());
    }

    #[test]
    fn insert_from_map_input() {
        let mut map = ValueMap::new();
        map.insert("username".to_string(), Value::from("new user"));
        map.insert("age".to_string(), Value::Int(18));
        let stmt = insert(POSTGRES, &Normalizer::default(), "user", map).unwrap();
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "user" ("age", "username") VALUES ($1, $2)"#
        );
        assert_eq!(stmt.args, vec![Value::Int(18), Value::from("new user")]);
    }

    #[test]
    fn replace_from_maps_input() {
        let rows: Vec<ValueMap> = (0..2)
            .map(|i| {
                let mut m = ValueMap::new();
                m.insert("id".to_string(), Value::Int(i));
                m
            })
            .collect();
        let stmt = replace(MYSQL, &Normalizer::default(), "t", rows).unwrap();
        assert_eq!(stmt.sql, "REPLACE INTO `t` (`id`) VALUES (?), (?)");
        assert_eq!(stmt.args, vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn normalizer_errors_abort_build() {
        let err = insert(MYSQL, &Normalizer::default(), "t", ValueMap::new()).unwrap_err();
        assert!(matches!(err, BindError::EmptyInput(_)));
    }
}

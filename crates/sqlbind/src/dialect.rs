//! SQL dialect support.
//!
//! A dialect decides two things: how identifiers are quoted and how parameter
//! placeholders are rendered. Backends are described by [`DialectSpec`] table
//! entries rather than special-cased inside the builder.
//!
//! # Example
//! ```ignore
//! use sqlbind::dialect::{Dialect, POSTGRES};
//!
//! assert_eq!(POSTGRES.quote("user"), r#""user""#);
//! assert_eq!(POSTGRES.placeholder(2), "$2");
//! ```

use crate::error::{BindError, BindResult};

/// Identifier quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `` `name` ``
    Backtick,
    /// `"name"`
    DoubleQuote,
    /// `[name]`
    Bracket,
}

/// Parameter placeholder style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// The same token for every position (e.g. `?`).
    Fixed(&'static str),
    /// A prefix followed by the 1-based position (e.g. `$1`, `$2`).
    Numbered(&'static str),
}

/// Trait for SQL dialect-specific rendering.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &str;

    /// Quote a single identifier.
    fn quote(&self, identifier: &str) -> String;

    /// Render the placeholder for a 1-based parameter position.
    fn placeholder(&self, position: usize) -> String;

    /// Quote a possibly dotted name, segment by segment.
    ///
    /// `public.users` becomes `"public"."users"`.
    fn quote_path(&self, name: &str) -> String {
        if name.find('.').is_some_and(|idx| idx > 0) {
            name.split('.')
                .map(|part| self.quote(part))
                .collect::<Vec<_>>()
                .join(".")
        } else {
            self.quote(name)
        }
    }

    /// Quote every column of a list with [`Dialect::quote_path`].
    fn quote_cols(&self, cols: &[String]) -> Vec<String> {
        cols.iter().map(|col| self.quote_path(col)).collect()
    }
}

/// A table-driven dialect description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectSpec {
    pub name: &'static str,
    pub quote_style: QuoteStyle,
    pub placeholder_style: PlaceholderStyle,
}

impl DialectSpec {
    pub const fn new(
        name: &'static str,
        quote_style: QuoteStyle,
        placeholder_style: PlaceholderStyle,
    ) -> Self {
        Self {
            name,
            quote_style,
            placeholder_style,
        }
    }
}

impl Dialect for DialectSpec {
    fn name(&self) -> &str {
        self.name
    }

    fn quote(&self, identifier: &str) -> String {
        let (open, close) = match self.quote_style {
            QuoteStyle::Backtick => ('`', '`'),
            QuoteStyle::DoubleQuote => ('"', '"'),
            QuoteStyle::Bracket => ('[', ']'),
        };
        let mut out = String::with_capacity(identifier.len() + 2);
        out.push(open);
        for ch in identifier.chars() {
            // Escape the closing quote by doubling it.
            if ch == close {
                out.push(close);
            }
            out.push(ch);
        }
        out.push(close);
        out
    }

    fn placeholder(&self, position: usize) -> String {
        match self.placeholder_style {
            PlaceholderStyle::Fixed(token) => token.to_string(),
            PlaceholderStyle::Numbered(prefix) => format!("{prefix}{position}"),
        }
    }
}

impl<D: Dialect + ?Sized> Dialect for &D {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn quote(&self, identifier: &str) -> String {
        (**self).quote(identifier)
    }

    fn placeholder(&self, position: usize) -> String {
        (**self).placeholder(position)
    }
}

/// MySQL / MariaDB: backtick quoting, `?` placeholders.
pub const MYSQL: DialectSpec =
    DialectSpec::new("mysql", QuoteStyle::Backtick, PlaceholderStyle::Fixed("?"));

/// PostgreSQL: double-quote quoting, `$N` placeholders.
pub const POSTGRES: DialectSpec = DialectSpec::new(
    "postgres",
    QuoteStyle::DoubleQuote,
    PlaceholderStyle::Numbered("$"),
);

/// SQLite: double-quote quoting, `?` placeholders.
pub const SQLITE: DialectSpec =
    DialectSpec::new("sqlite", QuoteStyle::DoubleQuote, PlaceholderStyle::Fixed("?"));

/// SQL Server: bracket quoting, `@pN` placeholders.
pub const MSSQL: DialectSpec = DialectSpec::new(
    "mssql",
    QuoteStyle::Bracket,
    PlaceholderStyle::Numbered("@p"),
);

const REGISTRY: &[(&str, DialectSpec)] = &[
    ("mysql", MYSQL),
    ("mariadb", MYSQL),
    ("postgres", POSTGRES),
    ("postgresql", POSTGRES),
    ("pg", POSTGRES),
    ("sqlite", SQLITE),
    ("sqlite3", SQLITE),
    ("mssql", MSSQL),
    ("sqlserver", MSSQL),
];

/// Look up a built-in dialect by name (case-insensitive).
pub fn lookup(name: &str) -> BindResult<DialectSpec> {
    let name = name.trim();
    REGISTRY
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, spec)| *spec)
        .ok_or_else(|| BindError::UnknownDialect(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_quotes_with_backticks() {
        assert_eq!(MYSQL.quote("user"), "`user`");
        assert_eq!(MYSQL.placeholder(1), "?");
        assert_eq!(MYSQL.placeholder(7), "?");
    }

    #[test]
    fn postgres_numbers_placeholders() {
        assert_eq!(POSTGRES.quote("user"), r#""user""#);
        assert_eq!(POSTGRES.placeholder(1), "$1");
        assert_eq!(POSTGRES.placeholder(12), "$12");
    }

    #[test]
    fn quote_escapes_embedded_quote() {
        assert_eq!(POSTGRES.quote(r#"has"quote"#), r#""has""quote""#);
        assert_eq!(MYSQL.quote("a`b"), "`a``b`");
        assert_eq!(MSSQL.quote("a]b"), "[a]]b]");
    }

    #[test]
    fn quote_path_splits_dotted_names() {
        assert_eq!(POSTGRES.quote_path("public.users"), r#""public"."users""#);
        assert_eq!(MYSQL.quote_path("users"), "`users`");
        // A leading dot is not a path separator.
        assert_eq!(MYSQL.quote_path(".users"), "`.users`");
    }

    #[test]
    fn quote_cols_quotes_each_column() {
        let cols = vec!["id".to_string(), "u.name".to_string()];
        assert_eq!(SQLITE.quote_cols(&cols), vec![r#""id""#, r#""u"."name""#]);
    }

    #[test]
    fn lookup_resolves_aliases() {
        assert_eq!(lookup("PostgreSQL").unwrap(), POSTGRES);
        assert_eq!(lookup("sqlite3").unwrap(), SQLITE);
        assert_eq!(lookup(" mysql ").unwrap(), MYSQL);
    }

    #[test]
    fn lookup_rejects_unknown() {
        let err = lookup("oracle").unwrap_err();
        assert!(matches!(err, BindError::UnknownDialect(name) if name == "oracle"));
    }

    #[test]
    fn reference_through_trait_object() {
        let dialect: &dyn Dialect = &POSTGRES;
        assert_eq!(dialect.name(), "postgres");
        assert_eq!((&dialect).placeholder(3), "$3");
    }
}

//! Configuration threaded into the normalizer and the scanner.

use crate::dialect::{self, DialectSpec};
use crate::error::BindResult;
use crate::value::TIME_LAYOUT;
use serde::Deserialize;

/// Tag name consulted for per-field column overrides unless configured otherwise.
pub const DEFAULT_TAG: &str = "db";

/// Dialect used unless configured otherwise.
pub const DEFAULT_DIALECT: &str = "mysql";

/// Configuration for [`Normalizer`](crate::Normalizer) and [`Scanner`](crate::Scanner).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```ignore
/// let config: sqlbind::Config = toml::from_str(r#"tag = "json""#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag whose override names columns.
    pub tag: String,
    /// Dialect name, resolved through [`dialect::lookup`].
    pub dialect: String,
    /// `chrono` format used when a timestamp is bound into a text field.
    pub time_layout: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            dialect: DEFAULT_DIALECT.to_string(),
            time_layout: TIME_LAYOUT.to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag name used for column overrides.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the dialect by name.
    pub fn dialect(mut self, name: impl Into<String>) -> Self {
        self.dialect = name.into();
        self
    }

    /// Set the timestamp text layout.
    pub fn time_layout(mut self, layout: impl Into<String>) -> Self {
        self.time_layout = layout.into();
        self
    }

    /// Resolve the configured dialect.
    pub fn dialect_spec(&self) -> BindResult<DialectSpec> {
        dialect::lookup(&self.dialect)
    }
}

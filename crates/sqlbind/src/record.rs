//! Record shapes: field descriptors and the naming convention.
//!
//! A record is a struct with named fields that can feed an INSERT (through
//! the normalizer) and receive a result row (through the scanner). The
//! descriptor table is emitted once per type by `#[derive(Record)]`:
//!
//! ```ignore
//! use sqlbind::Record;
//!
//! #[derive(Default, Record)]
//! pub struct User {
//!     pub id: i64,
//!     #[db(column = "user_name,omitempty")]
//!     pub name: String,
//!     pub email: Option<String>,
//!     secret: String, // private: never inserted, never bound
//! }
//! ```

use crate::error::BindResult;
use crate::scan::BindContext;
use crate::value::{ToValue, Value};

/// Declared kind of a destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Uint,
    Float,
    Bool,
    String,
    Bytes,
    Time,
    /// Decoded by a custom [`UnmarshalBytes`](crate::scan::UnmarshalBytes) implementation.
    Unmarshal,
    /// Receives the driver value unmodified.
    Raw,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Int => "int",
            FieldKind::Uint => "uint",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Time => "time",
            FieldKind::Unmarshal => "unmarshal",
            FieldKind::Raw => "raw",
        }
    }
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub field: &'static str,
    /// Column name derived from the field name (snake_case).
    pub derived: &'static str,
    /// Per-tag overrides, `(tag name, raw tag value)`.
    pub tags: &'static [(&'static str, &'static str)],
    pub kind: FieldKind,
    /// `Option<T>` field.
    pub optional: bool,
    /// Field decodes raw bytes through a custom unmarshaler.
    pub unmarshal: bool,
}

impl FieldDescriptor {
    /// Logical column name under the given tag.
    ///
    /// The tag's leading comma segment wins when non-empty, otherwise the
    /// derived name is used.
    pub fn column_name(&self, tag: &str) -> &'static str {
        let tags: &'static [(&'static str, &'static str)] = self.tags;
        tags.iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, value)| resolve_tag_name(value))
            .filter(|name| !name.is_empty())
            .unwrap_or(self.derived)
    }
}

/// Leading segment of a tag value: `"user_name,omitempty"` → `"user_name"`.
pub fn resolve_tag_name(tag: &str) -> &str {
    match tag.find(',') {
        Some(idx) => &tag[..idx],
        None => tag,
    }
}

/// Default column name for a field: CamelCase → snake_case.
pub fn column_name(field: &str) -> String {
    heck::AsSnakeCase(field).to_string()
}

/// Argument value of one field, aligned with [`Record::fields`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArg {
    pub value: Value,
    /// The field holds its type's zero value.
    pub zero: bool,
}

impl FieldArg {
    pub fn of<T: ToValue>(v: &T) -> Self {
        Self {
            value: v.to_value(),
            zero: v.is_zero(),
        }
    }
}

/// Trait for structs usable as INSERT input and as scan destinations.
///
/// This trait should typically be derived using `#[derive(Record)]`.
pub trait Record {
    /// Descriptors of the public, non-skipped fields in declaration order.
    fn fields() -> &'static [FieldDescriptor];

    /// Current field values, aligned with [`Record::fields`].
    fn field_args(&self) -> Vec<FieldArg>;

    /// Assign `value` to the field at `index`.
    ///
    /// Implementations return [`BindError::NotSettable`](crate::BindError::NotSettable)
    /// for an index with no descriptor.
    fn bind_field(&mut self, index: usize, value: &Value, ctx: &BindContext<'_>) -> BindResult<()>;
}

/// A record flattened into descriptors and argument values.
///
/// This is the owned form the normalizer consumes; it carries no borrow of
/// the source struct.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordArgs {
    pub fields: &'static [FieldDescriptor],
    pub args: Vec<FieldArg>,
}

impl RecordArgs {
    pub fn of<T: Record>(record: &T) -> Self {
        Self {
            fields: T::fields(),
            args: record.field_args(),
        }
    }
}

//! Row scanner: binds cursor rows into records or untyped maps.
//!
//! # Example
//!
//! ```ignore
//! use sqlbind::{Record, Scanner, VecCursor, Value};
//!
//! #[derive(Debug, Default, Record)]
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! let mut cursor = VecCursor::new(
//!     ["id", "name"],
//!     vec![vec![Value::Int(1), Value::Bytes(b"alice".to_vec())]],
//! );
//! let users: Vec<User> = Scanner::default().scan_all(&mut cursor)?;
//! ```

mod convert;
mod cursor;

pub use convert::{
    AcceptValue, BindContext, Bindable, UnmarshalBytes, accept_into, accept_option,
    unmarshal_into, unmarshal_option,
};
pub use cursor::{RowCursor, VecCursor};

use crate::config::Config;
use crate::error::{BindError, BindResult};
use crate::record::Record;
use crate::value::{Value, ValueMap};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Binds rows from a [`RowCursor`] into typed destinations.
///
/// Each output row costs exactly one `advance` and one `read`; the scanner
/// never reads ahead and never closes the cursor.
#[derive(Debug, Clone)]
pub struct Scanner {
    tag: String,
    time_layout: String,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Scanner {
    pub fn new(config: &Config) -> Self {
        Self {
            tag: config.tag.clone(),
            time_layout: config.time_layout.clone(),
        }
    }

    /// Tag consulted for column overrides.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn context(&self) -> BindContext<'_> {
        BindContext {
            time_layout: &self.time_layout,
        }
    }

    /// Bind the first row into a fresh `T`.
    ///
    /// Returns [`BindError::EmptyResult`] when the cursor has no rows.
    pub fn scan_one<'c, T, C>(&self, cursor: impl Into<Option<&'c mut C>>) -> BindResult<T>
    where
        T: Record + Default,
        C: RowCursor + 'c,
    {
        let mut dest = T::default();
        self.scan_into(cursor, &mut dest)?;
        Ok(dest)
    }

    /// Bind the first row into an existing value.
    ///
    /// Fields without a matching non-null column keep their current value.
    pub fn scan_into<'c, T, C>(
        &self,
        cursor: impl Into<Option<&'c mut C>>,
        dest: &mut T,
    ) -> BindResult<()>
    where
        T: Record,
        C: RowCursor + 'c,
    {
        let mut rows = RowReader::open(cursor.into())?;
        let row = rows.next_row()?.ok_or(BindError::EmptyResult)?;
        self.bind_row(&row, dest)?;
        tracing::debug!(target: "sqlbind", rows = 1, "scanned single row");
        Ok(())
    }

    /// Bind every row into a new `Vec<T>`. Zero rows is not an error.
    pub fn scan_all<'c, T, C>(&self, cursor: impl Into<Option<&'c mut C>>) -> BindResult<Vec<T>>
    where
        T: Record + Default,
        C: RowCursor + 'c,
    {
        let mut out = Vec::new();
        self.scan_append(cursor, &mut out)?;
        Ok(out)
    }

    /// Append one fresh `T` per row to `dest`, returning the number appended.
    ///
    /// A row that fails to bind is discarded; elements appended before it
    /// stay in `dest`.
    pub fn scan_append<'c, T, C>(
        &self,
        cursor: impl Into<Option<&'c mut C>>,
        dest: &mut Vec<T>,
    ) -> BindResult<usize>
    where
        T: Record + Default,
        C: RowCursor + 'c,
    {
        let mut rows = RowReader::open(cursor.into())?;
        let mut appended = 0;
        while let Some(row) = rows.next_row()? {
            let mut item = T::default();
            self.bind_row(&row, &mut item)?;
            dest.push(item);
            appended += 1;
        }
        tracing::debug!(target: "sqlbind", rows = appended, "scanned rows");
        Ok(appended)
    }

    /// Read every row as a column → value map, decoding byte values as text.
    pub fn scan_maps<'c, C>(&self, cursor: impl Into<Option<&'c mut C>>) -> BindResult<Vec<ValueMap>>
    where
        C: RowCursor + 'c,
    {
        let mut rows = RowReader::open(cursor.into())?;
        let mut out = Vec::new();
        while let Some(row) = rows.next_row()? {
            out.push(
                row.into_iter()
                    .map(|(column, value)| (column, value.into_text_decoded()))
                    .collect(),
            );
        }
        tracing::debug!(target: "sqlbind", rows = out.len(), "scanned rows as maps");
        Ok(out)
    }

    /// Bind one row, already keyed by column, into `dest`.
    ///
    /// Columns with no matching field are ignored. Missing and null columns
    /// leave the field untouched.
    pub fn bind_row<T: Record>(&self, row: &ValueMap, dest: &mut T) -> BindResult<()> {
        let ctx = self.context();
        for (index, desc) in T::fields().iter().enumerate() {
            let column = desc.column_name(&self.tag);
            let value = match row.get(column) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };
            let outcome = catch_unwind(AssertUnwindSafe(|| dest.bind_field(index, value, &ctx)));
            match outcome {
                Ok(result) => result.map_err(|e| e.with_column(column))?,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(
                        target: "sqlbind",
                        field = desc.field,
                        column,
                        %message,
                        "panic while binding field"
                    );
                    return Err(BindError::conversion(
                        column,
                        format!("panic while assigning field `{}`: {message}", desc.field),
                    ));
                }
            }
        }
        tracing::trace!(target: "sqlbind", fields = T::fields().len(), "bound row");
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Walks a cursor one row at a time, keying each row by column name.
struct RowReader<'c, C: RowCursor> {
    cursor: &'c mut C,
    columns: Vec<String>,
    slots: Vec<Value>,
}

impl<'c, C: RowCursor> RowReader<'c, C> {
    fn open(cursor: Option<&'c mut C>) -> BindResult<Self> {
        let cursor = cursor.ok_or(BindError::NilCursor)?;
        let columns = cursor.columns().map_err(BindError::Cursor)?;
        let slots = vec![Value::Null; columns.len()];
        Ok(Self {
            cursor,
            columns,
            slots,
        })
    }

    fn next_row(&mut self) -> BindResult<Option<ValueMap>> {
        if !self.cursor.advance().map_err(BindError::Cursor)? {
            return Ok(None);
        }
        self.slots.fill(Value::Null);
        self.cursor
            .read(&mut self.slots)
            .map_err(BindError::Cursor)?;
        Ok(Some(
            self.columns
                .iter()
                .cloned()
                .zip(self.slots.iter_mut().map(std::mem::take))
                .collect(),
        ))
    }
}

//! Row cursor abstraction.

use crate::error::BoxError;
use crate::value::Value;

/// A forward-only cursor over query result rows.
///
/// Implemented by the execution layer for each driver. Errors are returned
/// boxed and surface unchanged as [`BindError::Cursor`](crate::BindError::Cursor).
pub trait RowCursor {
    /// Column names of the result set, in order.
    fn columns(&mut self) -> Result<Vec<String>, BoxError>;

    /// Move to the next row. Returns `false` once the rows are exhausted.
    fn advance(&mut self) -> Result<bool, BoxError>;

    /// Copy the current row's values into `dest`, one slot per column.
    fn read(&mut self, dest: &mut [Value]) -> Result<(), BoxError>;

    /// Release the underlying result set.
    fn close(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<C: RowCursor + ?Sized> RowCursor for Box<C> {
    fn columns(&mut self) -> Result<Vec<String>, BoxError> {
        (**self).columns()
    }

    fn advance(&mut self) -> Result<bool, BoxError> {
        (**self).advance()
    }

    fn read(&mut self, dest: &mut [Value]) -> Result<(), BoxError> {
        (**self).read(dest)
    }

    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
}

/// An in-memory cursor over materialized rows.
///
/// Counts `advance` and `read` calls, which makes it handy for checking how a
/// consumer walks a result set.
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    advances: usize,
    reads: usize,
    closed: bool,
}

impl VecCursor {
    pub fn new<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            ..Self::default()
        }
    }

    /// Number of `advance` calls so far.
    pub fn advances(&self) -> usize {
        self.advances
    }

    /// Number of `read` calls so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl RowCursor for VecCursor {
    fn columns(&mut self) -> Result<Vec<String>, BoxError> {
        if self.closed {
            return Err("cursor is closed".into());
        }
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> Result<bool, BoxError> {
        if self.closed {
            return Ok(false);
        }
        self.advances += 1;
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn read(&mut self, dest: &mut [Value]) -> Result<(), BoxError> {
        self.reads += 1;
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or("read called without a current row")?;
        if row.len() != dest.len() {
            return Err(format!(
                "expected {} destination slots, got {}",
                row.len(),
                dest.len()
            )
            .into());
        }
        dest.clone_from_slice(row);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_rows_in_order() {
        let mut cursor = VecCursor::new(["id"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let mut slot = vec![Value::Null];

        assert!(cursor.advance().unwrap());
        cursor.read(&mut slot).unwrap();
        assert_eq!(slot[0], Value::Int(1));

        assert!(cursor.advance().unwrap());
        cursor.read(&mut slot).unwrap();
        assert_eq!(slot[0], Value::Int(2));

        assert!(!cursor.advance().unwrap());
        assert!(cursor.read(&mut slot).is_err());
        assert_eq!(cursor.advances(), 3);
        assert_eq!(cursor.reads(), 3);
    }

    #[test]
    fn read_checks_slot_count() {
        let mut cursor = VecCursor::new(["a", "b"], vec![vec![Value::Int(1), Value::Int(2)]]);
        cursor.advance().unwrap();
        let mut slot = vec![Value::Null];
        assert!(cursor.read(&mut slot).is_err());
    }

    #[test]
    fn closed_cursor_stops() {
        let mut cursor = VecCursor::new(["a"], vec![vec![Value::Int(1)]]);
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.columns().is_err());
    }
}

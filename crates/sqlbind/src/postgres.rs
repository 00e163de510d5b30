//! `tokio-postgres` integration.
//!
//! [`Value`] implements [`ToSql`] so built statements can be executed
//! directly, and [`PgRowCursor`] feeds fetched rows to the [`Scanner`](crate::Scanner):
//!
//! ```ignore
//! let stmt = sqlbind::insert(&sqlbind::dialect::POSTGRES, &normalizer, "users", input)?;
//! client.execute(stmt.sql.as_str(), &stmt.params()).await?;
//!
//! let rows = client.query("SELECT id, name FROM users", &[]).await?;
//! let users: Vec<User> = scanner.scan_all(&mut PgRowCursor::new(rows))?;
//! ```

use crate::builder::Statement;
use crate::error::BoxError;
use crate::scan::RowCursor;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            // Narrow to the column's width; the wire format is fixed-size.
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            // Postgres has no unsigned columns; values above i64::MAX are rejected.
            Value::Uint(v) => Value::Int(i64::try_from(*v)?).to_sql(ty, out),
            Value::Float32(v) => match *ty {
                Type::FLOAT8 => f64::from(*v).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Float64(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::BYTEA
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
        )
    }

    to_sql_checked!();
}

impl Statement {
    /// Arguments as a `tokio-postgres` parameter list.
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

/// [`RowCursor`] over rows already fetched with `tokio-postgres`.
///
/// Column values are decoded by their Postgres type into [`Value`].
pub struct PgRowCursor {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl PgRowCursor {
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Self {
            columns,
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl RowCursor for PgRowCursor {
    fn columns(&mut self) -> Result<Vec<String>, BoxError> {
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> Result<bool, BoxError> {
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn read(&mut self, dest: &mut [Value]) -> Result<(), BoxError> {
        let row = self.current.as_ref().ok_or("read called without a current row")?;
        if row.len() != dest.len() {
            return Err(format!("expected {} destination slots, got {}", row.len(), dest.len()).into());
        }
        for (idx, slot) in dest.iter_mut().enumerate() {
            *slot = decode(row, idx)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.current = None;
        self.rows = Vec::new().into_iter();
        Ok(())
    }
}

fn get<'a, T>(row: &'a Row, idx: usize) -> Result<Option<T>, BoxError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    Ok(row.try_get::<_, Option<T>>(idx)?)
}

fn decode(row: &Row, idx: usize) -> Result<Value, BoxError> {
    let ty = row.columns()[idx].type_();
    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx)?.map(Value::Int),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(Value::Float32),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(Value::Float64),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx)?.map(Value::Text)
        }
        Type::BYTEA => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(Value::Timestamp),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(|t| Value::Timestamp(t.naive_utc())),
        Type::JSON | Type::JSONB => {
            get::<serde_json::Value>(row, idx)?.map(|j| Value::Text(j.to_string()))
        }
        _ => return Err(format!("unsupported column type {ty} at index {idx}").into()),
    };
    Ok(value.unwrap_or(Value::Null))
}

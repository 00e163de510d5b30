//! Input normalization.
//!
//! Every supported input shape reduces to a [`RowSet`]: an ordered list of
//! columns plus one argument tuple per row, each tuple exactly as wide as the
//! column list.

use crate::config::Config;
use crate::error::{BindError, BindResult};
use crate::record::{Record, RecordArgs};
use crate::value::{Value, ValueMap};
use std::collections::HashMap;

/// A supported INSERT/REPLACE input shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// One row given as column → value.
    Map(ValueMap),
    /// Several rows; the first fixes the column set.
    Maps(Vec<ValueMap>),
    /// One record.
    Record(RecordArgs),
    /// Several records; the first fixes the column set.
    Records(Vec<RecordArgs>),
    /// Marks the inner input's column names for identifier quoting.
    ///
    /// Columns are always rendered through [`Dialect::quote_path`](crate::Dialect::quote_path),
    /// so this wrapper normalizes exactly like its inner input.
    Quoted(Box<Input>),
}

impl Input {
    /// Input from a single record.
    pub fn record<T: Record>(record: &T) -> Self {
        Input::Record(RecordArgs::of(record))
    }

    /// Input from a sequence of records.
    pub fn records<'a, T, I>(records: I) -> Self
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        Input::Records(records.into_iter().map(RecordArgs::of).collect())
    }

    /// Wrap this input so its columns are quoted as identifiers.
    pub fn quoted(self) -> Self {
        Input::Quoted(Box::new(self))
    }
}

impl From<ValueMap> for Input {
    fn from(map: ValueMap) -> Self {
        Input::Map(map)
    }
}

impl From<Vec<ValueMap>> for Input {
    fn from(maps: Vec<ValueMap>) -> Self {
        Input::Maps(maps)
    }
}

// Hash maps carry no stable order; their keys are sorted on the way in.
impl From<HashMap<String, Value>> for Input {
    fn from(map: HashMap<String, Value>) -> Self {
        Input::Map(map.into_iter().collect())
    }
}

impl From<Vec<HashMap<String, Value>>> for Input {
    fn from(maps: Vec<HashMap<String, Value>>) -> Self {
        Input::Maps(
            maps.into_iter()
                .map(|map| map.into_iter().collect())
                .collect(),
        )
    }
}

/// Canonical (columns, argument tuples) form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reduces [`Input`] shapes to a [`RowSet`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    tag: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Normalizer {
    pub fn new(config: &Config) -> Self {
        Self {
            tag: config.tag.clone(),
        }
    }

    pub fn normalize(&self, input: Input) -> BindResult<RowSet> {
        let set = match input {
            Input::Quoted(inner) => return self.normalize(*inner),
            Input::Map(map) => normalize_map(map)?,
            Input::Maps(maps) => normalize_maps(maps)?,
            Input::Record(record) => self.normalize_records(vec![record])?,
            Input::Records(records) => self.normalize_records(records)?,
        };
        tracing::trace!(
            target: "sqlbind",
            columns = set.columns.len(),
            rows = set.rows.len(),
            "normalized input"
        );
        Ok(set)
    }

    fn normalize_records(&self, records: Vec<RecordArgs>) -> BindResult<RowSet> {
        let mut records = records.into_iter();
        let Some(first) = records.next() else {
            return Err(BindError::EmptyInput("empty record sequence".to_string()));
        };
        if first.fields.is_empty() {
            return Err(BindError::InvalidShape(
                "record has no public fields".to_string(),
            ));
        }

        let fields = first.fields;
        let mut indexes = Vec::new();
        let mut columns = Vec::new();
        let mut row = Vec::new();
        for (idx, (desc, arg)) in first.fields.iter().zip(first.args).enumerate() {
            if arg.zero {
                continue;
            }
            indexes.push(idx);
            columns.push(desc.column_name(&self.tag).to_string());
            row.push(arg.value);
        }
        if columns.is_empty() {
            return Err(BindError::EmptyInput(
                "record has no set fields".to_string(),
            ));
        }

        let mut rows = vec![row];
        // Later records are read by field position against the first record's columns.
        for (offset, record) in records.enumerate() {
            let row_idx = offset + 1;
            if !std::ptr::eq(record.fields, fields) && record.fields != fields {
                return Err(BindError::InvalidShape(format!(
                    "values[{row_idx}] is a different record type than values[0]"
                )));
            }
            let mut row = Vec::with_capacity(indexes.len());
            for (col, &idx) in columns.iter().zip(&indexes) {
                let arg = record
                    .args
                    .get(idx)
                    .ok_or_else(|| BindError::column_mismatch(row_idx, col.as_str()))?;
                row.push(arg.value.clone());
            }
            rows.push(row);
        }

        Ok(RowSet { columns, rows })
    }
}

fn normalize_map(map: ValueMap) -> BindResult<RowSet> {
    if map.is_empty() {
        return Err(BindError::EmptyInput("empty map".to_string()));
    }
    let (columns, row): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
    Ok(RowSet {
        columns,
        rows: vec![row],
    })
}

fn normalize_maps(maps: Vec<ValueMap>) -> BindResult<RowSet> {
    let mut maps = maps.into_iter();
    let Some(first) = maps.next() else {
        return Err(BindError::EmptyInput("empty map sequence".to_string()));
    };
    let mut set = normalize_map(first)?;

    for (offset, mut map) in maps.enumerate() {
        let row_idx = offset + 1;
        let mut row = Vec::with_capacity(set.columns.len());
        for col in &set.columns {
            let value = map
                .remove(col)
                .ok_or_else(|| BindError::column_mismatch(row_idx, col.as_str()))?;
            row.push(value);
        }
        set.rows.push(row);
    }

    Ok(set)
}

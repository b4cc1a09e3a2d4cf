//! Storage backend interface for measurement results.
//!
//! Results are handed over as named columns. Every column in one batch must hold the
//! same, nonzero, number of values.

use thiserror::Error;

/// A single measured or configured value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Str(&'a str),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Null,
}

impl From<f64> for Value<'_> {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(value)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// A field name and its values.
pub type Column<'a> = (&'a str, &'a [Value<'a>]);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("No results given")]
    NoResults,
    #[error("Results contain no values")]
    EmptyColumns,
    #[error("Columns differ in length: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("Field named more than once")]
    DuplicateField,
    #[error("Fields differ from those already stored")]
    FieldMismatch,
}

/// Check a batch of results and return the number of rows in it.
pub fn validate_results(results: &[Column<'_>]) -> Result<usize, StorageError> {
    let ((_, first), rest) = results.split_first().ok_or(StorageError::NoResults)?;
    let expected = first.len();
    for (i, (name, values)) in rest.iter().enumerate() {
        if values.len() != expected {
            return Err(StorageError::LengthMismatch {
                expected,
                found: values.len(),
            });
        }
        if results[..=i].iter().any(|(other, _)| other == name) {
            return Err(StorageError::DuplicateField);
        }
    }
    if expected == 0 {
        return Err(StorageError::EmptyColumns);
    }
    Ok(expected)
}

/// Somewhere to put results, identified by the GUID of the run that produced them.
pub trait DataStorage {
    fn guid(&self) -> &str;

    /// Append a batch of results. Implementations should call [validate_results] first.
    fn store_results(&mut self, results: &[Column<'_>]) -> Result<(), StorageError>;
}

/// Owned copy of a [Value], as kept by [MemoryStorage].
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Str(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Null,
}

#[cfg(feature = "std")]
impl From<&Value<'_>> for StoredValue {
    fn from(value: &Value<'_>) -> Self {
        match *value {
            Value::Str(s) => StoredValue::Str(s.to_owned()),
            Value::Number(n) => StoredValue::Number(n),
            Value::Integer(n) => StoredValue::Integer(n),
            Value::Bool(b) => StoredValue::Bool(b),
            Value::Null => StoredValue::Null,
        }
    }
}

/// Keeps results in memory, one growing column per field.
///
/// The first batch fixes the set of fields; later batches must supply exactly the same
/// fields, in any order.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    guid: String,
    columns: Vec<(String, Vec<StoredValue>)>,
}

#[cfg(feature = "std")]
impl MemoryStorage {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            columns: Vec::new(),
        }
    }

    /// Field names in the order they were first stored.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&[StoredValue]> {
        self.columns
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Number of rows stored so far.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(feature = "std")]
impl DataStorage for MemoryStorage {
    fn guid(&self) -> &str {
        &self.guid
    }

    fn store_results(&mut self, results: &[Column<'_>]) -> Result<(), StorageError> {
        let rows = validate_results(results)?;

        if self.columns.is_empty() {
            self.columns = results
                .iter()
                .map(|(name, _)| ((*name).to_owned(), Vec::new()))
                .collect();
        } else if self.columns.len() != results.len()
            || results.iter().any(|(name, _)| self.column(name).is_none())
        {
            return Err(StorageError::FieldMismatch);
        }

        for (name, values) in results {
            if let Some((_, column)) = self.columns.iter_mut().find(|(field, _)| field == name) {
                column.extend(values.iter().map(StoredValue::from));
            }
        }
        log::debug!("{}: stored {} rows", self.guid, rows);
        Ok(())
    }
}

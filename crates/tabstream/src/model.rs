//! Record models: turning one line of text into one typed record
//!
//! A [`RecordModel`] is configured once and then called for every non-blank
//! line. The built-in [`ColumnModel`] splits on a separator and decodes each
//! field according to a [`ColumnSpec`]; custom models can produce any record
//! type.

use core::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, StreamError, StreamResult};

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: char = '\t';

/// Maps a single line of text to a record.
///
/// Implementations must be cheap to call and must not block; they run on the
/// producer side of the stream, once per line.
pub trait RecordModel: Send + Sync + 'static {
    /// The record type produced for each line
    type Record: Send + 'static;

    /// Decode one non-empty line.
    ///
    /// # Errors
    ///
    /// Returns a [`RecordError`] when the line does not match the model.
    fn parse_line(&self, line: &str) -> Result<Self::Record, RecordError>;
}

impl<M: RecordModel + ?Sized> RecordModel for Arc<M> {
    type Record = M::Record;

    fn parse_line(&self, line: &str) -> Result<Self::Record, RecordError> {
        (**self).parse_line(line)
    }
}

/// A record model backed by a plain function or closure.
pub struct FnModel<F, R> {
    parse: F,
    _record: PhantomData<fn() -> R>,
}

/// Wrap a closure as a [`RecordModel`].
pub fn model_fn<F, R>(parse: F) -> FnModel<F, R>
where
    F: Fn(&str) -> Result<R, RecordError> + Send + Sync + 'static,
    R: Send + 'static,
{
    FnModel {
        parse,
        _record: PhantomData,
    }
}

impl<F, R> RecordModel for FnModel<F, R>
where
    F: Fn(&str) -> Result<R, RecordError> + Send + Sync + 'static,
    R: Send + 'static,
{
    type Record = R;

    fn parse_line(&self, line: &str) -> Result<R, RecordError> {
        (self.parse)(line)
    }
}

/// The type of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Any UTF-8 text, kept verbatim
    Text,
    /// Signed 64-bit integer
    Integer,
    /// 64-bit float
    Float,
    /// `true`/`false`/`1`/`0`, case-insensitive
    Boolean,
}

impl ColumnKind {
    /// Decode a raw field. Empty fields of non-text kinds become [`Value::Null`].
    pub fn decode(self, raw: &str) -> Option<Value> {
        if raw.is_empty() && self != ColumnKind::Text {
            return Some(Value::Null);
        }

        match self {
            ColumnKind::Text => Some(Value::Text(raw.to_string())),
            ColumnKind::Integer => raw.trim().parse().ok().map(Value::Integer),
            ColumnKind::Float => raw.trim().parse().ok().map(Value::Float),
            ColumnKind::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Integer => write!(f, "integer"),
            ColumnKind::Float => write!(f, "float"),
            ColumnKind::Boolean => write!(f, "boolean"),
        }
    }
}

impl FromStr for ColumnKind {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => Ok(ColumnKind::Text),
            "integer" | "int" | "i64" => Ok(ColumnKind::Integer),
            "float" | "f64" | "double" => Ok(ColumnKind::Float),
            "boolean" | "bool" => Ok(ColumnKind::Boolean),
            other => Err(StreamError::config(format!("unknown column kind `{other}`"))),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name, used in error messages and keyed output
    pub name: String,
    /// Column type
    pub kind: ColumnKind,
}

impl ColumnSpec {
    /// Create a column specification.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for a text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// Shorthand for an integer column.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Integer)
    }

    /// Shorthand for a float column.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Float)
    }

    /// Shorthand for a boolean column.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }
}

/// Parses `name:kind`. A bare `name` is a text column.
impl FromStr for ColumnSpec {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, kind) = match s.split_once(':') {
            Some((name, kind)) => (name.trim(), kind.parse()?),
            None => (s, ColumnKind::Text),
        };

        if name.is_empty() {
            return Err(StreamError::config(format!(
                "column specification `{s}` has no name"
            )));
        }

        Ok(ColumnSpec::new(name, kind))
    }
}

/// Parse a comma-separated column list such as `name:text,age:integer`.
///
/// # Errors
///
/// Returns a configuration error for an empty list, an unknown kind, or a
/// missing column name.
pub fn parse_columns(list: &str) -> StreamResult<Vec<ColumnSpec>> {
    let columns = list
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<StreamResult<Vec<ColumnSpec>>>()?;

    if columns.is_empty() {
        return Err(StreamError::config("column list is empty"));
    }
    Ok(columns)
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text field
    Text(String),
    /// Integer field
    Integer(i64),
    /// Float field
    Float(f64),
    /// Boolean field
    Boolean(bool),
    /// Empty non-text field
    Null,
}

impl Value {
    /// The text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content, if this is an integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// The float content, if this is a float value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean content, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

/// One decoded line: values in column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Build a [`Row`] from heterogeneous literals.
///
/// ```
/// use tabstream::{row, Value};
///
/// let r = row!["a", 1];
/// assert_eq!(r.get(1), Some(&Value::Integer(1)));
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::Row::new(vec![$($crate::Value::from($value)),*])
    };
}

/// The default model: separator-delimited fields decoded per column.
#[derive(Debug, Clone)]
pub struct ColumnModel {
    columns: Arc<[ColumnSpec]>,
    separator: char,
}

impl ColumnModel {
    /// Build a model over `columns` split on `separator`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `columns` is empty or contains
    /// duplicate names.
    pub fn new(columns: Vec<ColumnSpec>, separator: char) -> StreamResult<Self> {
        if columns.is_empty() {
            return Err(StreamError::config("at least one column is required"));
        }

        for (i, column) in columns.iter().enumerate() {
            if columns
                .iter()
                .skip(i.saturating_add(1))
                .any(|other| other.name == column.name)
            {
                return Err(StreamError::config(format!(
                    "duplicate column name `{}`",
                    column.name
                )));
            }
        }

        Ok(Self {
            columns: columns.into(),
            separator,
        })
    }

    /// Tab-separated model over `columns`.
    ///
    /// # Errors
    ///
    /// See [`ColumnModel::new`].
    pub fn tab_separated(columns: Vec<ColumnSpec>) -> StreamResult<Self> {
        Self::new(columns, DEFAULT_SEPARATOR)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Index of a column by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl RecordModel for ColumnModel {
    type Record = Row;

    fn parse_line(&self, line: &str) -> Result<Row, RecordError> {
        let found = line.split(self.separator).count();
        if found != self.columns.len() {
            return Err(RecordError::FieldCount {
                expected: self.columns.len(),
                found,
            });
        }

        let values = self
            .columns
            .iter()
            .zip(line.split(self.separator))
            .map(|(column, raw)| {
                column
                    .kind
                    .decode(raw)
                    .ok_or_else(|| RecordError::InvalidField {
                        column: column.name.clone(),
                        kind: column.kind,
                        value: raw.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Row::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn name_and_count() -> StreamResult<ColumnModel> {
        ColumnModel::tab_separated(vec![ColumnSpec::text("name"), ColumnSpec::integer("count")])
    }

    #[test]
    fn test_parse_two_columns() -> TestResult {
        let model = name_and_count()?;
        assert_eq!(model.parse_line("a\t1"), Ok(row!["a", 1]));
        assert_eq!(model.parse_line("b\t-42"), Ok(row!["b", -42]));
        Ok(())
    }

    #[test]
    fn test_field_count_mismatch() -> TestResult {
        let model = name_and_count()?;
        assert_eq!(
            model.parse_line("a"),
            Err(RecordError::FieldCount {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            model.parse_line("a\t1\textra"),
            Err(RecordError::FieldCount {
                expected: 2,
                found: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_integer() -> TestResult {
        let model = name_and_count()?;
        let err = model.parse_line("a\tone");
        assert_eq!(
            err,
            Err(RecordError::InvalidField {
                column: "count".to_string(),
                kind: ColumnKind::Integer,
                value: "one".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_empty_fields() -> TestResult {
        let model = name_and_count()?;
        assert_eq!(
            model.parse_line("\t"),
            Ok(Row::new(vec![Value::from(""), Value::Null]))
        );
        Ok(())
    }

    #[test]
    fn test_boolean_and_float_kinds() -> TestResult {
        let model = ColumnModel::new(
            vec![ColumnSpec::boolean("flag"), ColumnSpec::float("ratio")],
            ',',
        )?;

        assert_eq!(model.parse_line("TRUE,0.5"), Ok(row![true, 0.5]));
        assert_eq!(model.parse_line("0,2"), Ok(row![false, 2.0]));
        assert!(model.parse_line("maybe,1").is_err());
        Ok(())
    }

    #[test]
    fn test_column_spec_from_str() {
        assert_eq!(
            "age:integer".parse::<ColumnSpec>().ok(),
            Some(ColumnSpec::integer("age"))
        );
        assert_eq!(
            " name ".parse::<ColumnSpec>().ok(),
            Some(ColumnSpec::text("name"))
        );
        assert!(":integer".parse::<ColumnSpec>().is_err());
        assert!("x:decimal".parse::<ColumnSpec>().is_err());
    }

    #[test]
    fn test_parse_columns_list() {
        let columns = parse_columns("name:text, count:int ,ok:bool");
        assert_eq!(
            columns.ok(),
            Some(vec![
                ColumnSpec::text("name"),
                ColumnSpec::integer("count"),
                ColumnSpec::boolean("ok"),
            ])
        );
        assert!(parse_columns(" , ").is_err());
    }

    #[test]
    fn test_model_rejects_bad_columns() {
        assert!(ColumnModel::tab_separated(Vec::new()).is_err());
        assert!(
            ColumnModel::tab_separated(vec![ColumnSpec::text("a"), ColumnSpec::integer("a")])
                .is_err()
        );
    }

    #[test]
    fn test_fn_model() {
        let model = model_fn(|line: &str| {
            line.parse::<u32>()
                .map_err(|e| RecordError::custom(e.to_string()))
        });
        assert_eq!(model.parse_line("12"), Ok(12));
        assert!(model.parse_line("x").is_err());
    }

    #[test]
    fn test_row_display_is_tab_joined() {
        let r = Row::new(vec![Value::from("a"), Value::Null, Value::from(3)]);
        assert_eq!(r.to_string(), "a\t\t3");
    }
}

//! Column and schema definitions.

use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef as ArrowSchemaRef, TimeUnit};
use sf_error::{Result, SchemaError, TransformError};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Declared type of a column.
///
/// Only these types can cross the scripting boundary. Anything else is
/// rejected when the [`Schema`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Int64,
    Float64,
    Boolean,
    /// Timestamp stored in the given Arrow unit.
    Timestamp(TimeUnit),
}

impl ColumnType {
    /// Maps an Arrow type onto a column type.
    ///
    /// Timestamps of any unit are accepted. The timezone annotation is kept
    /// on the [`Column`], not here.
    pub fn from_data_type(column: &str, data_type: &DataType) -> Result<Self> {
        let column_type = match data_type {
            DataType::Utf8 => Self::String,
            DataType::Int64 => Self::Int64,
            DataType::Float64 => Self::Float64,
            DataType::Boolean => Self::Boolean,
            DataType::Timestamp(unit, _) => Self::Timestamp(*unit),
            other => {
                return Err(TransformError::UnsupportedType {
                    column: column.to_string(),
                    data_type: other.to_string(),
                }
                .into());
            }
        };
        Ok(column_type)
    }

    /// Returns the Arrow type for this column type, without a timezone.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::String => DataType::Utf8,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Boolean => DataType::Boolean,
            Self::Timestamp(unit) => DataType::Timestamp(*unit, None),
        }
    }

    /// Returns true if `data_type` is a valid physical layout for this column.
    pub fn accepts(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Self::Timestamp(unit), DataType::Timestamp(other, _)) => unit == other,
            _ => self.data_type() == *data_type,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int64 => write!(f, "int64"),
            Self::Float64 => write!(f, "float64"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp(TimeUnit::Second) => write!(f, "timestamp[s]"),
            Self::Timestamp(TimeUnit::Millisecond) => write!(f, "timestamp[ms]"),
            Self::Timestamp(TimeUnit::Microsecond) => write!(f, "timestamp[us]"),
            Self::Timestamp(TimeUnit::Nanosecond) => write!(f, "timestamp[ns]"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "str" | "utf8" => Ok(Self::String),
            "int64" | "long" | "integer" | "int" => Ok(Self::Int64),
            "float64" | "double" | "float" => Ok(Self::Float64),
            "boolean" | "bool" => Ok(Self::Boolean),
            "timestamp" | "timestamp[ms]" => Ok(Self::Timestamp(TimeUnit::Millisecond)),
            "timestamp[s]" => Ok(Self::Timestamp(TimeUnit::Second)),
            "timestamp[us]" => Ok(Self::Timestamp(TimeUnit::Microsecond)),
            "timestamp[ns]" => Ok(Self::Timestamp(TimeUnit::Nanosecond)),
            other => Err(SchemaError::InvalidSpec(format!("unknown column type '{other}'"))),
        }
    }
}

/// A named, typed slot present in every record of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    index: usize,
    name: String,
    column_type: ColumnType,
    /// Timezone annotation of a timestamp column. The stored instant is UTC
    /// either way.
    timezone: Option<Arc<str>>,
}

impl Column {
    /// Position of the column within its schema.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    #[inline]
    pub fn timezone(&self) -> Option<&Arc<str>> {
        self.timezone.as_ref()
    }

    /// Returns the Arrow type of this column, timezone included.
    pub fn data_type(&self) -> DataType {
        match self.column_type {
            ColumnType::Timestamp(unit) => DataType::Timestamp(unit, self.timezone.clone()),
            other => other.data_type(),
        }
    }
}

/// Ordered, immutable sequence of columns with unique names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
}

/// Shared schema handle.
pub type SchemaRef = Arc<Schema>;

impl Schema {
    /// Creates a schema from `(name, type)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateColumn`] if two columns share a name.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut built = Vec::new();

        for (index, (name, column_type)) in columns.into_iter().enumerate() {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateColumn(name).into());
            }
            built.push(Column {
                index,
                name,
                column_type,
                timezone: None,
            });
        }

        Ok(Self { columns: built })
    }

    /// Builds a schema from an Arrow schema, rejecting unsupported types.
    pub fn try_from_arrow(schema: &ArrowSchema) -> Result<Self> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                ColumnType::from_data_type(field.name(), field.data_type())
                    .map(|column_type| (field.name().clone(), column_type))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut built = Self::new(columns)?;
        for (column, field) in built.columns.iter_mut().zip(schema.fields()) {
            if let DataType::Timestamp(_, timezone) = field.data_type() {
                column.timezone = timezone.clone();
            }
        }
        Ok(built)
    }

    /// Parses a `name:type,name:type` specification.
    ///
    /// ```
    /// use sf_types::{ColumnType, Schema};
    ///
    /// let schema = Schema::parse("id:long, name:string").unwrap();
    /// assert_eq!(schema.len(), 2);
    /// assert_eq!(schema.columns()[0].column_type(), ColumnType::Int64);
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let mut columns = Vec::new();

        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, type_name) = part.split_once(':').ok_or_else(|| {
                SchemaError::InvalidSpec(format!("expected name:type, got '{part}'"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SchemaError::InvalidSpec(format!("missing column name in '{part}'")).into());
            }
            columns.push((name.to_string(), type_name.parse::<ColumnType>()?));
        }

        Self::new(columns)
    }

    /// Returns the equivalent Arrow schema. All fields are nullable.
    pub fn to_arrow(&self) -> ArrowSchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.as_str(), c.data_type(), true))
            .collect();
        Arc::new(ArrowSchema::new(fields))
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns true if a column named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Looks up a column by name.
    pub fn lookup(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::ColumnNotFound(name.to_string()).into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

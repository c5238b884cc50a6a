//! Typed columnar cell values.

use crate::schema::ColumnType;
use chrono::{DateTime, Utc};

/// One typed cell of a columnar record.
///
/// A cell is either null or a value of its column's declared type. A whole
/// record in this form is simply `Vec<Cell>` in schema order.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    String(String),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if this cell may be stored in a column of `column_type`.
    pub fn fits(&self, column_type: ColumnType) -> bool {
        matches!(
            (self, column_type),
            (Self::Null, _)
                | (Self::String(_), ColumnType::String)
                | (Self::Int64(_), ColumnType::Int64)
                | (Self::Float64(_), ColumnType::Float64)
                | (Self::Boolean(_), ColumnType::Boolean)
                | (Self::Timestamp(_), ColumnType::Timestamp(_))
        )
    }
}

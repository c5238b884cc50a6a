//! Core types for the script filter stage.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`Schema`] / [`Column`] / [`ColumnType`] - Declared record layout
//! - [`Cell`] - Typed columnar cell value
//! - [`Value`] / [`GenericRecord`] - Loosely-typed record form seen by scripts
//! - [`PageReader`] / [`PageBuilder`] - Record-at-a-time access to Arrow pages

pub mod cell;
pub mod page;
pub mod schema;
pub mod value;

pub use cell::*;
pub use page::*;
pub use schema::*;
pub use value::*;

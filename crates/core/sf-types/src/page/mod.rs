//! Page I/O: reading typed cells from input pages and building output pages.
//!
//! A page is an Arrow [`RecordBatch`](arrow::record_batch::RecordBatch)
//! whose columns follow a [`Schema`](crate::Schema).

mod builder;
mod reader;

pub use builder::PageBuilder;
pub use reader::PageReader;

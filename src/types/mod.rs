//! Data types exchanged with the underlying client.

mod column;
mod query;
mod row;
mod value;

pub use column::{ColumnDescription, ColumnType};
pub(crate) use column::split_columns;
pub use query::{ExternalTable, Parameters, Settings};
pub use row::Row;
pub use value::Value;

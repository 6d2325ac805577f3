//! ClickHouse DB-API adapter for Rust
//!
//! A cursor/connection layer with DB-API 2.0 semantics over an underlying
//! columnar-database client. The adapter stages per-cursor options, runs
//! queries in buffered or streaming mode, hands out rows through
//! `fetch_one`/`fetch_many`/`fetch_all`, and reports every failure through a
//! single [`Error`] taxonomy.
//!
//! The wire protocol is not implemented here: plug in any [`Client`] through
//! a [`Driver`].
//!
//! # Example
//!
//! ```no_run
//! use clickhouse_dbapi::{connect, Client, ConnectOptions, ConnectParams, Result};
//!
//! async fn run<C: Client>(driver: impl Fn(&ConnectParams) -> C) -> Result<()> {
//!     let mut conn = connect(driver, ConnectOptions::new().host("localhost").user("default"))?;
//!
//!     let mut cursor = conn.cursor();
//!     cursor.set_stream_results(true, 10_000);
//!     cursor.execute("SELECT number FROM system.numbers LIMIT 100000", None).await?;
//!
//!     while let Some(row) = cursor.fetch_one().await? {
//!         println!("{:?}", row);
//!     }
//!
//!     conn.close().await;
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod client;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod params;
pub mod types;

// Re-export main types
pub use client::{
    Client, Driver, DriverError, QueryOptions, QueryParams, Response, RowStream, StreamItem,
};
pub use connection::Connection;
pub use cursor::{Cursor, CursorState};
pub use error::{Error, ErrorKind, Result};
pub use params::{ClientInfo, ConnectOptions, ConnectParams};
pub use types::{ColumnDescription, ColumnType, ExternalTable, Parameters, Row, Settings, Value};

/// DB-API level supported.
pub const APILEVEL: &str = "2.0";

/// Connections may be shared between threads, cursors may not.
pub const THREADSAFETY: u8 = 2;

/// Placeholder style: `%(name)s`.
pub const PARAMSTYLE: &str = "pyformat";

/// Create a connection.
///
/// A DSN in `options` takes precedence over the discrete fields. Nothing is
/// sent to the server until a cursor executes its first query.
pub fn connect<D: Driver>(driver: D, options: ConnectOptions) -> Result<Connection<D>> {
    let params = options.resolve()?;
    Ok(Connection::new(driver, params))
}

//! Contract of the underlying database client.
//!
//! The adapter does not speak the wire protocol itself. It drives a [`Client`]
//! built by a [`Driver`] and only relies on the shapes defined here.

use crate::params::ConnectParams;
use crate::types::{ColumnType, ExternalTable, Parameters, Row, Settings};
use futures::stream::BoxStream;
use std::future::Future;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// The client's native error type.
///
/// The adapter catches exactly this type and never lets it reach callers
/// unwrapped.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Exception reported by the server.
    #[error("Code: {code}. {message}")]
    Server { code: u32, message: String },

    /// Network failure.
    #[error("Network error: {0}")]
    Network(#[from] io::Error),

    /// Socket timed out.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Unexpected packet from the server.
    #[error("Unexpected packet from server: {0}")]
    UnexpectedPacket(String),

    /// Parameter or column type mismatch detected by the client.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Any other client failure.
    #[error("{0}")]
    Other(String),
}

/// Parameters handed to [`Client::execute`].
#[derive(Debug, Clone, Copy)]
pub enum QueryParams<'a> {
    None,
    One(&'a Parameters),
    /// Bulk insert/update: one parameter set per row.
    Many(&'a [Parameters]),
}

impl<'a> From<Option<&'a Parameters>> for QueryParams<'a> {
    fn from(params: Option<&'a Parameters>) -> Self {
        params.map_or(QueryParams::None, QueryParams::One)
    }
}

/// Per-call options handed to the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions<'a> {
    /// Server settings, `None` when the caller never set any.
    pub settings: Option<&'a Settings>,
    /// External tables, `None` when no table is registered.
    pub external_tables: Option<&'a [ExternalTable]>,
    /// Validate parameter types strictly.
    pub types_check: bool,
    /// Return column names and types alongside rows.
    pub with_column_types: bool,
}

/// Response of a buffered execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Nothing returned (DDL and similar).
    Empty,
    /// A fully materialized result set.
    Rows {
        rows: Vec<Row>,
        columns: Vec<ColumnType>,
    },
    /// Number of rows written by an insert.
    Written(u64),
}

/// One element of a streaming result.
///
/// The first element of a stream is always `Columns`; every later one is a
/// `Row`.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Columns(Vec<ColumnType>),
    Row(Row),
}

/// Lazy result of [`Client::execute_iter`].
pub type RowStream = BoxStream<'static, Result<StreamItem, DriverError>>;

/// An underlying database client.
///
/// Clients connect lazily: constructing one performs no I/O and connection
/// failures surface on the first call.
pub trait Client: Send {
    /// Execute a query and return its fully materialized response.
    fn execute(
        &mut self,
        query: &str,
        params: QueryParams<'_>,
        options: &QueryOptions<'_>,
    ) -> impl Future<Output = Result<Response, DriverError>> + Send;

    /// Execute a query and return its rows as a lazy stream.
    ///
    /// Each pull from the stream may perform network I/O to read the next
    /// block. The block size is taken from the `max_block_size` setting.
    fn execute_iter(
        &mut self,
        query: &str,
        params: Option<&Parameters>,
        options: &QueryOptions<'_>,
    ) -> impl Future<Output = Result<RowStream, DriverError>> + Send;

    /// Close the connection to the server.
    ///
    /// Streams created earlier must fail cleanly once the client is
    /// disconnected.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), DriverError>> + Send;
}

/// Builds clients from connection parameters.
///
/// Any `Fn(&ConnectParams) -> C` closure is a driver.
pub trait Driver {
    type Client: Client;

    /// Construct a new, not yet connected client.
    fn new_client(&self, params: &ConnectParams) -> Self::Client;
}

impl<F, C> Driver for F
where
    F: Fn(&ConnectParams) -> C,
    C: Client,
{
    type Client = C;

    fn new_client(&self, params: &ConnectParams) -> C {
        self(params)
    }
}

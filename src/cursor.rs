//! DB-API cursor over an underlying client.
//!
//! A [`Cursor`] owns one client, runs queries through it and hands out rows
//! from either a materialized buffer or a lazy stream. Per-cursor options
//! (streaming, settings, external tables, type checking) are staged on the
//! cursor and apply to every following execution until changed.

use crate::client::{Client, QueryOptions, QueryParams, Response, RowStream, StreamItem};
use crate::error::{translate_driver_error, Error, Result};
use crate::types::{
    split_columns, ColumnDescription, ColumnType, ExternalTable, Parameters, Row, Settings, Value,
};
use futures::stream::{Fuse, StreamExt};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::debug;

/// Setting forced to the row buffer size when streaming.
pub const MAX_BLOCK_SIZE_SETTING: &str = "max_block_size";

/// Lifecycle of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No query executed yet.
    Unset,
    /// A query is in flight, or the last one failed.
    Running,
    /// A result is available for fetching.
    Finished,
    /// Terminal; the client has been disconnected.
    Closed,
}

/// Rows of the current result.
enum ResultSet {
    Empty,
    Buffered(VecDeque<Row>),
    Streamed(Fuse<RowStream>),
}

impl ResultSet {
    /// Pull the next row.
    async fn next_row(&mut self) -> Result<Option<Row>> {
        match self {
            ResultSet::Empty => Ok(None),
            ResultSet::Buffered(rows) => Ok(rows.pop_front()),
            ResultSet::Streamed(stream) => match stream.next().await {
                None => Ok(None),
                Some(Ok(StreamItem::Row(row))) => Ok(Some(row)),
                Some(Ok(StreamItem::Columns(_))) => Err(Error::interface(
                    "Column header in the middle of a result stream",
                )),
                Some(Err(e)) => Err(translate_driver_error(e)),
            },
        }
    }

    /// Pull up to `size` rows.
    async fn next_rows(&mut self, size: usize) -> Result<Vec<Row>> {
        if let ResultSet::Buffered(rows) = self {
            let n = size.min(rows.len());
            return Ok(rows.drain(..n).collect());
        }

        let mut out = Vec::new();
        while out.len() < size {
            match self.next_row().await? {
                Some(row) => out.push(row),
                None => break,
            }
        }
        Ok(out)
    }

    /// Pull every remaining row.
    async fn drain(&mut self) -> Result<Vec<Row>> {
        if let ResultSet::Buffered(rows) = self {
            return Ok(std::mem::take(rows).into());
        }

        let mut out = Vec::new();
        while let Some(row) = self.next_row().await? {
            out.push(row);
        }
        debug!(rows = out.len(), "Result stream drained");
        Ok(out)
    }
}

/// A DB-API cursor.
///
/// # Example
///
/// ```no_run
/// # async fn run<C: clickhouse_dbapi::Client>(mut cursor: clickhouse_dbapi::Cursor<C>)
/// #     -> clickhouse_dbapi::Result<()> {
/// use clickhouse_dbapi::Parameters;
///
/// let params = Parameters::named([("min", 10u32)]);
/// cursor.execute("SELECT id, name FROM users WHERE id > %(min)s", Some(&params)).await?;
///
/// for column in cursor.description() {
///     println!("{} {}", column.name, column.type_code);
/// }
/// while let Some(row) = cursor.fetch_one().await? {
///     println!("{:?}", row);
/// }
/// cursor.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Cursor<C: Client> {
    client: Arc<Mutex<C>>,
    state: CursorState,
    columns: Vec<String>,
    types: Vec<String>,
    rows: ResultSet,
    rowcount: i64,
    arraysize: isize,
    stream_results: bool,
    max_row_buffer: usize,
    settings: Option<Settings>,
    external_tables: Vec<ExternalTable>,
    types_check: bool,
}

impl<C: Client> Cursor<C> {
    /// Wrap a client in a new cursor.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            state: CursorState::Unset,
            columns: Vec::new(),
            types: Vec::new(),
            rows: ResultSet::Empty,
            rowcount: -1,
            arraysize: -1,
            stream_results: false,
            max_row_buffer: 0,
            settings: None,
            external_tables: Vec::new(),
            types_check: false,
        }
    }

    /// Handle used by the owning connection to disconnect this cursor's client.
    pub(crate) fn client_handle(&self) -> Weak<Mutex<C>> {
        Arc::downgrade(&self.client)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    /// Column names of the last result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column types of the last result, paired positionally with `columns()`.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// One description per result column.
    ///
    /// Size, precision and scale are not known and always `None`.
    pub fn description(&self) -> Vec<ColumnDescription> {
        self.columns
            .iter()
            .zip(&self.types)
            .map(|(name, type_code)| ColumnDescription::new(name.as_str(), type_code.as_str()))
            .collect()
    }

    /// Rows written by the last `execute_many`, `-1` otherwise.
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// Default batch size of `fetch_many(None)`.
    pub fn arraysize(&self) -> isize {
        self.arraysize
    }

    /// Set the default batch size of `fetch_many(None)`.
    ///
    /// Zero or negative sizes make `fetch_many(None)` return no rows.
    pub fn set_arraysize(&mut self, size: isize) {
        self.arraysize = size;
    }

    /// Execute a query.
    ///
    /// Any previous result is discarded. Staged options are kept.
    pub async fn execute(&mut self, query: &str, params: Option<&Parameters>) -> Result<()> {
        self.check_cursor_closed()?;
        self.begin_query();

        debug!(stream = self.stream_results, "Executing query: {}", query);

        let client = Arc::clone(&self.client);
        let mut client = client.lock().await;

        if self.stream_results {
            let settings = self.stream_settings();
            let options = QueryOptions {
                settings: Some(&settings),
                external_tables: self.external_tables_param(),
                types_check: self.types_check,
                with_column_types: false,
            };
            let stream = client
                .execute_iter(query, params, &options)
                .await
                .map_err(translate_driver_error)?;
            drop(client);
            self.process_stream(stream).await?;
        } else {
            let options = QueryOptions {
                settings: self.settings.as_ref(),
                external_tables: self.external_tables_param(),
                types_check: self.types_check,
                with_column_types: true,
            };
            let response = client
                .execute(query, params.into(), &options)
                .await
                .map_err(translate_driver_error)?;
            drop(client);
            self.process_response(response);
        }

        self.end_query();
        Ok(())
    }

    /// Execute a bulk insert or update, one parameter set per row.
    ///
    /// Only the affected row count is kept; see [`Cursor::rowcount`].
    pub async fn execute_many(&mut self, query: &str, seq_of_params: &[Parameters]) -> Result<()> {
        self.check_cursor_closed()?;
        self.begin_query();

        debug!(rows = seq_of_params.len(), "Executing bulk query: {}", query);

        let client = Arc::clone(&self.client);
        let mut client = client.lock().await;

        let options = QueryOptions {
            settings: self.settings.as_ref(),
            external_tables: self.external_tables_param(),
            types_check: self.types_check,
            with_column_types: false,
        };
        let response = client
            .execute(query, QueryParams::Many(seq_of_params), &options)
            .await
            .map_err(translate_driver_error)?;
        drop(client);

        self.rowcount = match response {
            Response::Written(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Response::Empty => 0,
            Response::Rows { .. } => {
                return Err(Error::interface("Bulk execution returned a result set"));
            }
        };
        debug!(rowcount = self.rowcount, "Bulk query finished");

        self.end_query();
        Ok(())
    }

    /// Fetch the next row, `None` when the result is exhausted.
    pub async fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.check_query_started()?;
        self.rows.next_row().await
    }

    /// Fetch up to `size` rows; `None` uses [`Cursor::arraysize`].
    pub async fn fetch_many(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.check_query_started()?;

        let size = match size {
            Some(size) => size,
            None => match usize::try_from(self.arraysize) {
                Ok(size) => size,
                Err(_) => return Ok(Vec::new()),
            },
        };
        if size == 0 {
            return Ok(Vec::new());
        }

        self.rows.next_rows(size).await
    }

    /// Fetch every remaining row.
    pub async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.check_query_started()?;
        self.rows.drain().await
    }

    /// Disconnect the client and close the cursor.
    ///
    /// Closing an already closed cursor does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == CursorState::Closed {
            return Ok(());
        }

        self.state = CursorState::Closed;
        self.rows = ResultSet::Empty;
        debug!("Closing cursor");

        let mut client = self.client.lock().await;
        client.disconnect().await.map_err(translate_driver_error)
    }

    /// Accepted for DB-API compatibility; does nothing.
    pub fn set_input_sizes(&mut self, _sizes: &[usize]) {}

    /// Accepted for DB-API compatibility; does nothing.
    pub fn set_output_size(&mut self, _size: usize, _column: Option<usize>) {}

    /// Switch between buffered and streamed results.
    ///
    /// When streaming, `max_row_buffer` is sent as the `max_block_size`
    /// setting of every following query.
    pub fn set_stream_results(&mut self, stream_results: bool, max_row_buffer: usize) {
        self.stream_results = stream_results;
        self.max_row_buffer = max_row_buffer;
    }

    pub fn stream_results(&self) -> bool {
        self.stream_results
    }

    /// Stage server settings for following queries.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = Some(settings);
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// Ask the client to check parameter types strictly.
    pub fn set_types_check(&mut self, types_check: bool) {
        self.types_check = types_check;
    }

    pub fn types_check(&self) -> bool {
        self.types_check
    }

    /// Register an external table sent with every following query.
    ///
    /// Registering a name again replaces the earlier table.
    pub fn set_external_table<N, T>(
        &mut self,
        name: impl Into<String>,
        structure: impl IntoIterator<Item = (N, T)>,
        data: Vec<Row>,
    ) where
        N: Into<String>,
        T: Into<String>,
    {
        let table = ExternalTable::new(
            name,
            structure
                .into_iter()
                .map(|(n, t)| (n.into(), t.into()))
                .collect(),
            data,
        );

        match self.external_tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.external_tables.push(table),
        }
    }

    /// Remove one external table, returning it if it was registered.
    pub fn remove_external_table(&mut self, name: &str) -> Option<ExternalTable> {
        let idx = self.external_tables.iter().position(|t| t.name == name)?;
        Some(self.external_tables.remove(idx))
    }

    pub fn clear_external_tables(&mut self) {
        self.external_tables.clear();
    }

    /// Registered external tables in registration order.
    pub fn external_tables(&self) -> &[ExternalTable] {
        &self.external_tables
    }

    fn external_tables_param(&self) -> Option<&[ExternalTable]> {
        if self.external_tables.is_empty() {
            None
        } else {
            Some(&self.external_tables)
        }
    }

    /// Staged settings with the block size forced to the row buffer.
    fn stream_settings(&self) -> Settings {
        let mut settings = self.settings.clone().unwrap_or_default();
        settings.insert(
            MAX_BLOCK_SIZE_SETTING.to_string(),
            Value::from(self.max_row_buffer),
        );
        settings
    }

    fn process_response(&mut self, response: Response) {
        match response {
            Response::Rows { rows, columns } => {
                debug!(rows = rows.len(), columns = columns.len(), "Buffered result");
                self.set_columns(columns);
                self.rows = ResultSet::Buffered(rows.into());
            }
            Response::Written(n) => {
                debug!(written = n, "Write acknowledged; no result set");
            }
            Response::Empty => {}
        }
    }

    /// Read the column header and keep the rest of the stream unconsumed.
    async fn process_stream(&mut self, stream: RowStream) -> Result<()> {
        let mut stream = stream.fuse();

        match stream.next().await {
            None => debug!("Result stream is empty"),
            Some(Ok(StreamItem::Columns(columns))) => {
                debug!(columns = columns.len(), "Streamed result");
                self.set_columns(columns);
                self.rows = ResultSet::Streamed(stream);
            }
            Some(Ok(StreamItem::Row(_))) => {
                return Err(Error::interface(
                    "Result stream did not start with a column header",
                ));
            }
            Some(Err(e)) => return Err(translate_driver_error(e)),
        }
        Ok(())
    }

    fn set_columns(&mut self, columns: Vec<ColumnType>) {
        let (names, types) = split_columns(columns);
        self.columns = names;
        self.types = types;
    }

    fn begin_query(&mut self) {
        self.state = CursorState::Running;
        self.columns.clear();
        self.types.clear();
        self.rows = ResultSet::Empty;
        self.rowcount = -1;
    }

    fn end_query(&mut self) {
        self.state = CursorState::Finished;
    }

    fn check_cursor_closed(&self) -> Result<()> {
        if self.state == CursorState::Closed {
            return Err(Error::CursorClosed);
        }
        Ok(())
    }

    fn check_query_started(&self) -> Result<()> {
        match self.state {
            CursorState::Closed => Err(Error::CursorClosed),
            CursorState::Unset => Err(Error::NoQueryYet),
            CursorState::Running | CursorState::Finished => Ok(()),
        }
    }
}

impl<C: Client> fmt::Debug for Cursor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = match &self.rows {
            ResultSet::Empty => "empty",
            ResultSet::Buffered(_) => "buffered",
            ResultSet::Streamed(_) => "streamed",
        };
        f.debug_struct("Cursor")
            .field("state", &self.state)
            .field("columns", &self.columns)
            .field("types", &self.types)
            .field("rows", &rows)
            .field("rowcount", &self.rowcount)
            .field("stream_results", &self.stream_results)
            .finish_non_exhaustive()
    }
}

//! Blocking wrappers around [`crate::Connection`] and [`crate::Cursor`].
//!
//! Every call blocks the calling thread until the client returns. The
//! wrappers drive the async API on a private current-thread runtime, so they
//! must not be used from inside another async runtime.

use crate::client::{Client, Driver};
use crate::cursor::CursorState;
use crate::error::{Error, Result};
use crate::params::{ConnectOptions, ConnectParams};
use crate::types::{ColumnDescription, ExternalTable, Parameters, Row, Settings};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

fn build_runtime() -> Result<Arc<Runtime>> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| Error::Internal {
            message: format!("Failed to start runtime: {}", e),
        })
}

/// Blocking counterpart of [`crate::connect`].
pub fn connect<D: Driver>(driver: D, options: ConnectOptions) -> Result<Connection<D>> {
    let inner = crate::connect(driver, options)?;
    Ok(Connection {
        inner,
        runtime: build_runtime()?,
    })
}

/// Blocking DB-API connection.
pub struct Connection<D: Driver> {
    inner: crate::Connection<D>,
    runtime: Arc<Runtime>,
}

impl<D: Driver> Connection<D> {
    pub fn params(&self) -> &ConnectParams {
        self.inner.params()
    }

    /// Open a new cursor backed by a fresh client.
    pub fn cursor(&mut self) -> Cursor<D::Client> {
        Cursor {
            inner: self.inner.cursor(),
            runtime: Arc::clone(&self.runtime),
            exhausted: false,
        }
    }

    pub fn close(&mut self) {
        self.runtime.block_on(self.inner.close());
    }

    pub fn commit(&self) -> Result<()> {
        self.inner.commit()
    }

    pub fn rollback(&self) -> Result<()> {
        self.inner.rollback()
    }
}

/// Blocking DB-API cursor.
pub struct Cursor<C: Client> {
    inner: crate::Cursor<C>,
    runtime: Arc<Runtime>,
    // Set once iteration yields an error; cleared by the next execute.
    exhausted: bool,
}

impl<C: Client> Cursor<C> {
    /// Wrap a client in a new blocking cursor with its own runtime.
    pub fn new(client: C) -> Result<Self> {
        Ok(Self {
            inner: crate::Cursor::new(client),
            runtime: build_runtime()?,
            exhausted: false,
        })
    }

    pub fn state(&self) -> CursorState {
        self.inner.state()
    }

    pub fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    pub fn types(&self) -> &[String] {
        self.inner.types()
    }

    pub fn description(&self) -> Vec<ColumnDescription> {
        self.inner.description()
    }

    pub fn rowcount(&self) -> i64 {
        self.inner.rowcount()
    }

    pub fn arraysize(&self) -> isize {
        self.inner.arraysize()
    }

    pub fn set_arraysize(&mut self, size: isize) {
        self.inner.set_arraysize(size);
    }

    pub fn execute(&mut self, query: &str, params: Option<&Parameters>) -> Result<()> {
        self.exhausted = false;
        self.runtime.block_on(self.inner.execute(query, params))
    }

    pub fn execute_many(&mut self, query: &str, seq_of_params: &[Parameters]) -> Result<()> {
        self.exhausted = false;
        self.runtime
            .block_on(self.inner.execute_many(query, seq_of_params))
    }

    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.runtime.block_on(self.inner.fetch_one())
    }

    pub fn fetch_many(&mut self, size: Option<usize>) -> Result<Vec<Row>> {
        self.runtime.block_on(self.inner.fetch_many(size))
    }

    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.runtime.block_on(self.inner.fetch_all())
    }

    pub fn close(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.close())
    }

    pub fn set_input_sizes(&mut self, sizes: &[usize]) {
        self.inner.set_input_sizes(sizes);
    }

    pub fn set_output_size(&mut self, size: usize, column: Option<usize>) {
        self.inner.set_output_size(size, column);
    }

    pub fn set_stream_results(&mut self, stream_results: bool, max_row_buffer: usize) {
        self.inner.set_stream_results(stream_results, max_row_buffer);
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.inner.set_settings(settings);
    }

    pub fn set_types_check(&mut self, types_check: bool) {
        self.inner.set_types_check(types_check);
    }

    pub fn set_external_table<N, T>(
        &mut self,
        name: impl Into<String>,
        structure: impl IntoIterator<Item = (N, T)>,
        data: Vec<Row>,
    ) where
        N: Into<String>,
        T: Into<String>,
    {
        self.inner.set_external_table(name, structure, data);
    }

    pub fn remove_external_table(&mut self, name: &str) -> Option<ExternalTable> {
        self.inner.remove_external_table(name)
    }
}

/// Yields rows until the result is exhausted. The first error is yielded
/// once and ends the iteration until the next `execute`.
impl<C: Client> Iterator for Cursor<C> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.fetch_one().transpose();
        if matches!(item, None | Some(Err(_))) {
            self.exhausted = true;
        }
        item
    }
}

//! DB-API connection.

use crate::client::{Client, Driver};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::params::ConnectParams;
use std::sync::Weak;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A DB-API connection.
///
/// The connection holds configuration only. Every cursor gets its own client,
/// built on demand by the driver, and the connection remembers the cursors it
/// issued so that [`Connection::close`] can disconnect them all.
///
/// # Example
///
/// ```no_run
/// use clickhouse_dbapi::{connect, Client, ConnectOptions, ConnectParams};
///
/// # async fn run<C: Client>(make_client: impl Fn(&ConnectParams) -> C)
/// #     -> clickhouse_dbapi::Result<()> {
/// let mut conn = connect(make_client, ConnectOptions::from_dsn("clickhouse://localhost/default"))?;
///
/// let mut cursor = conn.cursor();
/// cursor.execute("SELECT 1", None).await?;
/// let rows = cursor.fetch_all().await?;
///
/// conn.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Connection<D: Driver> {
    driver: D,
    params: ConnectParams,
    cursors: Vec<Weak<Mutex<D::Client>>>,
}

impl<D: Driver> Connection<D> {
    /// Create a connection from resolved parameters.
    ///
    /// No I/O happens here; clients connect on their first query.
    pub fn new(driver: D, params: ConnectParams) -> Self {
        info!(address = %params.address(), database = %params.database, "Connection configured");
        Self {
            driver,
            params,
            cursors: Vec::new(),
        }
    }

    /// Connection parameters every new client is built from.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Open a new cursor backed by a fresh client.
    pub fn cursor(&mut self) -> Cursor<D::Client> {
        let client = self.driver.new_client(&self.params);
        let cursor = Cursor::new(client);

        self.cursors.retain(|c| c.strong_count() > 0);
        self.cursors.push(cursor.client_handle());
        debug!(open_cursors = self.cursors.len(), "Cursor created");

        cursor
    }

    /// Number of issued cursors that are still alive.
    pub fn open_cursors(&self) -> usize {
        self.cursors.iter().filter(|c| c.strong_count() > 0).count()
    }

    /// Disconnect the clients of every cursor issued by this connection.
    ///
    /// Disconnect failures are logged and skipped.
    pub async fn close(&mut self) {
        let handles = std::mem::take(&mut self.cursors);
        let mut disconnected = 0usize;

        for handle in handles {
            let Some(client) = handle.upgrade() else {
                continue;
            };
            let mut client = client.lock().await;
            match client.disconnect().await {
                Ok(()) => disconnected += 1,
                Err(e) => warn!(error = %e, "Failed to disconnect cursor client"),
            }
        }

        info!(disconnected, "Connection closed");
    }

    /// No-op: the database has no transactions.
    pub fn commit(&self) -> Result<()> {
        Ok(())
    }

    /// No-op: the database has no transactions.
    pub fn rollback(&self) -> Result<()> {
        Ok(())
    }
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.params.address())
            .field("database", &self.params.database)
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}

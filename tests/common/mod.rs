//! Scripted in-memory client for integration tests.

#![allow(dead_code)]

use clickhouse_dbapi::{
    Client, ColumnType, ConnectParams, Driver, DriverError, ExternalTable, Parameters,
    QueryOptions, QueryParams, Response, Row, RowStream, Settings, StreamItem,
};
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Parameters as the client received them.
#[derive(Debug, Clone, PartialEq)]
pub enum SeenParams {
    None,
    One(Parameters),
    Many(Vec<Parameters>),
}

/// One call made to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub query: String,
    pub params: SeenParams,
    pub settings: Option<Settings>,
    pub external_tables: Option<Vec<ExternalTable>>,
    pub types_check: bool,
    pub with_column_types: bool,
}

/// What the client answers to the next call.
pub enum Reply {
    Response(Response),
    Stream(Vec<Result<StreamItem, DriverError>>),
    Fail(DriverError),
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    replies: VecDeque<Reply>,
    disconnects: usize,
    connected: bool,
    fail_disconnect: bool,
}

/// Client answering from a queue of scripted replies.
///
/// Clones share state, so a test can keep one clone to script and inspect
/// the client a cursor owns.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, reply: Reply) -> &Self {
        self.state.lock().unwrap().replies.push_back(reply);
        self
    }

    pub fn reply_rows(&self, rows: Vec<Row>, columns: Vec<ColumnType>) -> &Self {
        self.reply(Reply::Response(Response::Rows { rows, columns }))
    }

    pub fn reply_stream(&self, columns: Vec<ColumnType>, rows: Vec<Row>) -> &Self {
        let mut items = vec![Ok(StreamItem::Columns(columns))];
        items.extend(rows.into_iter().map(|r| Ok(StreamItem::Row(r))));
        self.reply(Reply::Stream(items))
    }

    pub fn fail_disconnect(&self) {
        self.state.lock().unwrap().fail_disconnect = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn last_call(&self) -> Call {
        self.calls().pop().expect("no call recorded")
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn record(
        &self,
        method: &'static str,
        query: &str,
        params: SeenParams,
        options: &QueryOptions<'_>,
    ) -> Option<Reply> {
        let mut state = self.state.lock().unwrap();
        state.connected = true;
        state.calls.push(Call {
            method,
            query: query.to_string(),
            params,
            settings: options.settings.cloned(),
            external_tables: options.external_tables.map(<[ExternalTable]>::to_vec),
            types_check: options.types_check,
            with_column_types: options.with_column_types,
        });
        state.replies.pop_front()
    }
}

impl Client for MockClient {
    async fn execute(
        &mut self,
        query: &str,
        params: QueryParams<'_>,
        options: &QueryOptions<'_>,
    ) -> Result<Response, DriverError> {
        let seen = match params {
            QueryParams::None => SeenParams::None,
            QueryParams::One(p) => SeenParams::One(p.clone()),
            QueryParams::Many(ps) => SeenParams::Many(ps.to_vec()),
        };
        match self.record("execute", query, seen, options) {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fail(e)) => Err(e),
            Some(Reply::Stream(_)) => Err(DriverError::Other("stream scripted for execute".into())),
            None => Ok(Response::Empty),
        }
    }

    async fn execute_iter(
        &mut self,
        query: &str,
        params: Option<&Parameters>,
        options: &QueryOptions<'_>,
    ) -> Result<RowStream, DriverError> {
        let seen = params.map_or(SeenParams::None, |p| SeenParams::One(p.clone()));
        let items = match self.record("execute_iter", query, seen, options) {
            Some(Reply::Stream(items)) => items,
            Some(Reply::Fail(e)) => return Err(e),
            Some(Reply::Response(_)) => {
                return Err(DriverError::Other("response scripted for execute_iter".into()))
            }
            None => Vec::new(),
        };

        // Pulls after a disconnect fail like a closed socket would.
        let state = Arc::clone(&self.state);
        Ok(stream::iter(items)
            .map(move |item| {
                if state.lock().unwrap().connected {
                    item
                } else {
                    Err(DriverError::Network(std::io::Error::new(
                        std::io::ErrorKind::NotConnected,
                        "socket closed",
                    )))
                }
            })
            .boxed())
    }

    async fn disconnect(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.disconnects += 1;
        state.connected = false;
        if state.fail_disconnect {
            return Err(DriverError::Other("disconnect failed".into()));
        }
        Ok(())
    }
}

/// Driver keeping a handle on every client it builds.
#[derive(Clone, Default)]
pub struct MockDriver {
    clients: Arc<Mutex<Vec<(ConnectParams, MockClient)>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the `index`-th client built.
    pub fn client(&self, index: usize) -> MockClient {
        self.clients.lock().unwrap()[index].1.clone()
    }

    /// Parameters the `index`-th client was built from.
    pub fn params(&self, index: usize) -> ConnectParams {
        self.clients.lock().unwrap()[index].0.clone()
    }

    pub fn built(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

impl Driver for MockDriver {
    type Client = MockClient;

    fn new_client(&self, params: &ConnectParams) -> MockClient {
        let client = MockClient::new();
        self.clients
            .lock()
            .unwrap()
            .push((params.clone(), client.clone()));
        client
    }
}

pub fn col(name: &str, type_name: &str) -> ColumnType {
    ColumnType::new(name, type_name)
}

/// Rows `(1,) .. (n,)`.
pub fn numbered_rows(n: u64) -> Vec<Row> {
    (1..=n).map(|i| clickhouse_dbapi::row![i]).collect()
}

//! Query inputs: parameters, settings and external tables.

use super::row::Row;
use super::value::Value;
use std::collections::BTreeMap;

/// Server settings applied to a query, e.g. `max_block_size`.
pub type Settings = BTreeMap<String, Value>;

/// Parameters for one query, or one row of a bulk insert.
///
/// Named parameters fill `%(name)s` placeholders; positional parameters are
/// how insert rows are usually given.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    Named(BTreeMap<String, Value>),
    Positional(Vec<Value>),
}

impl Parameters {
    /// Build named parameters from `(name, value)` pairs.
    pub fn named<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Parameters::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Number of parameter values.
    pub fn len(&self) -> usize {
        match self {
            Parameters::Named(map) => map.len(),
            Parameters::Positional(values) => values.len(),
        }
    }

    /// Check if there are no parameter values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Parameters::Named(map) => map.get(name),
            Parameters::Positional(_) => None,
        }
    }
}

impl From<BTreeMap<String, Value>> for Parameters {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Parameters::Named(map)
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(values: Vec<Value>) -> Self {
        Parameters::Positional(values)
    }
}

impl From<Row> for Parameters {
    fn from(row: Row) -> Self {
        Parameters::Positional(row.into_iter().collect())
    }
}

/// A named inline dataset sent along with a query.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTable {
    /// Table name as referenced by the query.
    pub name: String,
    /// `(column name, type name)` pairs.
    pub structure: Vec<(String, String)>,
    /// Table rows.
    pub data: Vec<Row>,
}

impl ExternalTable {
    pub fn new(
        name: impl Into<String>,
        structure: Vec<(String, String)>,
        data: Vec<Row>,
    ) -> Self {
        Self {
            name: name.into(),
            structure,
            data,
        }
    }
}

//! Row type for query results.

use super::value::Value;

/// A row of query results, or one row of bulk-insert / external-table data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    /// Column values in result order.
    values: Vec<Value>,
}

impl Row {
    /// Create a new row from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get value by column index (0-based).
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over values.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Build a [`Row`] from a list of values convertible into [`Value`].
///
/// ```
/// use clickhouse_dbapi::{row, Value};
///
/// let r = row![1u8, "one", None::<i32>];
/// assert_eq!(r.get(1), Some(&Value::String("one".into())));
/// ```
#[macro_export]
macro_rules! row {
    () => {
        $crate::Row::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Row::new(vec![$($crate::Value::from($value)),+])
    };
}

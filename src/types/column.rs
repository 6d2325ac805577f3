//! Column metadata and DB-API column descriptions.

/// Name and server type of one result column, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Column name.
    pub name: String,
    /// Server type name, e.g. `UInt8` or `Nullable(String)`.
    pub type_name: String,
}

impl ColumnType {
    /// Create a new column type.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

impl<N: Into<String>, T: Into<String>> From<(N, T)> for ColumnType {
    fn from((name, type_name): (N, T)) -> Self {
        Self::new(name, type_name)
    }
}

/// One entry of `Cursor::description()`.
///
/// Only `name` and `type_code` carry information; the size, precision and
/// scale slots are always `None` and `null_ok` is always `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: String,
    pub display_size: Option<u32>,
    pub internal_size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub null_ok: bool,
}

impl ColumnDescription {
    /// Describe a column from its name and type.
    pub fn new(name: impl Into<String>, type_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: type_code.into(),
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: true,
        }
    }
}

/// Split `(name, type)` pairs into positionally matching name and type lists.
pub(crate) fn split_columns(columns: Vec<ColumnType>) -> (Vec<String>, Vec<String>) {
    columns
        .into_iter()
        .map(|c| (c.name, c.type_name))
        .unzip()
}

/// Statement execution against the admin interface
pub mod mysql;

use crate::core::Field;
use crate::error::{AdminError, AdminResult};
use std::str::FromStr;

pub use mysql::MySqlExecutor;

/// One result row, as the nullable text cells the admin interface returns
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminRow {
    cells: Vec<Option<String>>,
}

impl AdminRow {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn into_cells(self) -> Vec<Option<String>> {
        self.cells
    }

    /// Non-NULL text of a cell
    pub fn text(&self, index: usize, field: Field) -> AdminResult<&str> {
        match self.cells.get(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(AdminError::decode(format!("{} is NULL", field))),
            None => Err(AdminError::decode(format!(
                "{} missing at column {}",
                field, index
            ))),
        }
    }

    /// Parse a cell into a number
    pub fn parse<T: FromStr>(&self, index: usize, field: Field) -> AdminResult<T> {
        let text = self.text(index, field)?;
        text.trim()
            .parse()
            .map_err(|_| AdminError::decode(format!("{} has invalid value {:?}", field, text)))
    }
}

/// Minimal capability the client needs from a connection.
///
/// Implementations must send statements verbatim; the admin interface only
/// understands plain text queries.
#[async_trait::async_trait]
pub trait AdminExecutor: Send + Sync {
    /// Run a statement, returning the number of affected rows
    async fn execute(&self, sql: &str) -> AdminResult<u64>;

    /// Run a query, returning every row
    async fn query(&self, sql: &str) -> AdminResult<Vec<AdminRow>>;

    async fn ping(&self) -> AdminResult<()>;

    async fn close(&self);
}

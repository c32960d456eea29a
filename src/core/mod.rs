/// Core model shared by every client operation: host rows, option
/// resolution and statement rendering
pub mod host;
pub mod options;
pub mod query;

pub use host::{Field, FieldValue, Host, HostStatus};
pub use options::{HostOpt, HostQuery, ServersTable, RUNTIME_TABLE, STAGED_TABLE};

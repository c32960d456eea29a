/// Statement rendering for the backend servers tables
///
/// Everything here is pure: descriptors and hosts go in, statement text comes
/// out. Column order in every statement is the canonical table order.
use crate::core::host::Host;
use crate::core::options::{HostQuery, ServersTable};
use crate::error::ValidationError;

/// Writes the staged servers configuration to the proxy's disk database
pub const SAVE_TO_DISK: &str = "save mysql servers to disk";
/// Promotes the staged servers configuration to runtime
pub const LOAD_TO_RUNTIME: &str = "load mysql servers to runtime";

/// Insert a full row built from the descriptor, defaults applied
pub fn build_insert_query(query: &HostQuery) -> Result<String, ValidationError> {
    let host = query.to_host()?;
    Ok(build_insert_host_query(query.table(), &host))
}

pub fn build_insert_host_query(table: ServersTable, host: &Host) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        host.columns().join(", "),
        host.values().join(", ")
    )
}

/// Select rows matching every specified column; no WHERE when none are given
pub fn build_select_query(query: &HostQuery) -> String {
    match query.predicate() {
        Some(predicate) => format!("SELECT * FROM {} WHERE {}", query.table(), predicate),
        None => build_select_all_query(query.table()),
    }
}

pub fn build_select_all_query(table: ServersTable) -> String {
    format!("SELECT * FROM {}", table)
}

/// Delete rows matching every specified column.
///
/// Refuses an empty predicate; [`build_clear_query`] is the only way to
/// produce an unconditional delete.
pub fn build_delete_query(query: &HostQuery) -> Result<String, ValidationError> {
    let predicate = query.predicate().ok_or(ValidationError::EmptyPredicate {
        operation: "delete",
    })?;
    Ok(format!("DELETE FROM {} WHERE {}", query.table(), predicate))
}

pub fn build_delete_host_query(host: &Host) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        ServersTable::Staged,
        host.where_predicate()
    )
}

pub fn build_update_weight_query(host: &Host, weight: u32) -> String {
    format!(
        "UPDATE {} SET weight={} WHERE {}",
        ServersTable::Staged,
        weight,
        host.where_predicate()
    )
}

pub fn build_clear_query() -> String {
    format!("DELETE FROM {}", ServersTable::Staged)
}

/// Sparse host options and their resolution into a query descriptor
use crate::core::host::{
    check_value, Field, FieldValue, Host, HostStatus, DEFAULT_MAX_CONNECTIONS, DEFAULT_WEIGHT,
};
use crate::error::ValidationError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const STAGED_TABLE: &str = "mysql_servers";
pub const RUNTIME_TABLE: &str = "runtime_mysql_servers";

/// Which backend servers table a statement targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServersTable {
    /// Pending configuration, edited by every write operation
    #[default]
    Staged,
    /// Configuration the proxy is currently routing with
    Runtime,
}

impl ServersTable {
    pub fn name(self) -> &'static str {
        match self {
            ServersTable::Staged => STAGED_TABLE,
            ServersTable::Runtime => RUNTIME_TABLE,
        }
    }
}

impl fmt::Display for ServersTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServersTable {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STAGED_TABLE => Ok(ServersTable::Staged),
            RUNTIME_TABLE => Ok(ServersTable::Runtime),
            other => Err(ValidationError::UnknownTable(other.to_string())),
        }
    }
}

/// One caller-supplied override: a table selector or a single column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOpt {
    Table(String),
    HostgroupId(u32),
    Hostname(String),
    Port(u16),
    GtidPort(u16),
    Status(HostStatus),
    Weight(u32),
    Compression(u32),
    MaxConnections(u32),
    MaxReplicationLag(u32),
    UseSsl(bool),
    MaxLatencyMs(u32),
    Comment(String),
}

impl HostOpt {
    pub fn table<S: Into<String>>(name: S) -> Self {
        HostOpt::Table(name.into())
    }

    pub fn hostname<S: Into<String>>(hostname: S) -> Self {
        HostOpt::Hostname(hostname.into())
    }

    pub fn comment<S: Into<String>>(comment: S) -> Self {
        HostOpt::Comment(comment.into())
    }

    /// The column this option sets, `None` for the table selector
    pub fn field(&self) -> Option<Field> {
        self.field_value().map(|(field, _)| field)
    }

    fn field_value(&self) -> Option<(Field, FieldValue)> {
        let pair = match self {
            HostOpt::Table(_) => return None,
            HostOpt::HostgroupId(v) => (Field::HostgroupId, FieldValue::Int((*v).into())),
            HostOpt::Hostname(v) => (Field::Hostname, FieldValue::Text(v.clone())),
            HostOpt::Port(v) => (Field::Port, FieldValue::Int((*v).into())),
            HostOpt::GtidPort(v) => (Field::GtidPort, FieldValue::Int((*v).into())),
            HostOpt::Status(v) => (Field::Status, FieldValue::Status(*v)),
            HostOpt::Weight(v) => (Field::Weight, FieldValue::Int((*v).into())),
            HostOpt::Compression(v) => (Field::Compression, FieldValue::Int((*v).into())),
            HostOpt::MaxConnections(v) => (Field::MaxConnections, FieldValue::Int((*v).into())),
            HostOpt::MaxReplicationLag(v) => {
                (Field::MaxReplicationLag, FieldValue::Int((*v).into()))
            }
            HostOpt::UseSsl(v) => (Field::UseSsl, FieldValue::Flag(*v)),
            HostOpt::MaxLatencyMs(v) => (Field::MaxLatencyMs, FieldValue::Int((*v).into())),
            HostOpt::Comment(v) => (Field::Comment, FieldValue::Text(v.clone())),
        };
        Some(pair)
    }
}

/// Resolved set of options: target table plus the explicitly specified columns.
///
/// Presence in `fields` is what marks a column as specified, so `weight = 0`
/// and "weight not given" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostQuery {
    table: ServersTable,
    fields: BTreeMap<Field, FieldValue>,
}

impl HostQuery {
    /// Resolve options without requiring any particular column.
    ///
    /// Options apply in call order: a repeated column or table selector
    /// overwrites the earlier one.
    pub fn resolve(opts: &[HostOpt]) -> Result<Self, ValidationError> {
        let mut query = HostQuery::default();
        for opt in opts {
            match opt {
                HostOpt::Table(name) => query.table = name.parse()?,
                _ => {
                    if let Some((field, value)) = opt.field_value() {
                        check_value(field, &value)?;
                        query.fields.insert(field, value);
                    }
                }
            }
        }
        Ok(query)
    }

    /// Resolve options that must identify a host by name
    pub fn resolve_with_hostname(opts: &[HostOpt]) -> Result<Self, ValidationError> {
        let query = Self::resolve(opts)?;
        if !query.is_specified(Field::Hostname) {
            return Err(ValidationError::MissingField(Field::Hostname));
        }
        Ok(query)
    }

    pub fn table(&self) -> ServersTable {
        self.table
    }

    /// Specified columns in canonical order
    pub fn specified_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }

    pub fn is_specified(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// True when only a table (or nothing) was given
    pub fn is_unfiltered(&self) -> bool {
        self.fields.is_empty()
    }

    /// Conjunction of `column=value` over the specified columns, if any
    pub fn predicate(&self) -> Option<String> {
        if self.fields.is_empty() {
            return None;
        }
        Some(
            self.fields
                .iter()
                .map(|(field, value)| format!("{}={}", field.column(), value.to_sql()))
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    /// Build a full row, filling documented defaults for unspecified columns.
    ///
    /// `hostname` and `port` have no default.
    pub fn to_host(&self) -> Result<Host, ValidationError> {
        let hostname = match self.get(Field::Hostname) {
            Some(FieldValue::Text(hostname)) => hostname.clone(),
            _ => return Err(ValidationError::MissingField(Field::Hostname)),
        };
        let port = self.port_or(Field::Port, None)?;

        let host = Host {
            hostgroup_id: self.u32_or(Field::HostgroupId, 0)?,
            hostname,
            port,
            gtid_port: self.port_or(Field::GtidPort, Some(0))?,
            status: match self.get(Field::Status) {
                Some(FieldValue::Status(status)) => *status,
                _ => HostStatus::Online,
            },
            weight: self.u32_or(Field::Weight, DEFAULT_WEIGHT)?,
            compression: self.u32_or(Field::Compression, 0)?,
            max_connections: self.u32_or(Field::MaxConnections, DEFAULT_MAX_CONNECTIONS)?,
            max_replication_lag: self.u32_or(Field::MaxReplicationLag, 0)?,
            use_ssl: matches!(self.get(Field::UseSsl), Some(FieldValue::Flag(true))),
            max_latency_ms: self.u32_or(Field::MaxLatencyMs, 0)?,
            comment: match self.get(Field::Comment) {
                Some(FieldValue::Text(comment)) => comment.clone(),
                _ => String::new(),
            },
        };
        host.valid()?;
        Ok(host)
    }

    fn u32_or(&self, field: Field, default: u32) -> Result<u32, ValidationError> {
        match self.get(field) {
            None => Ok(default),
            Some(FieldValue::Int(value)) => u32::try_from(*value)
                .map_err(|_| ValidationError::invalid(field, format!("{} out of range", value))),
            Some(other) => Err(ValidationError::invalid(
                field,
                format!("unexpected value {:?}", other),
            )),
        }
    }

    fn port_or(&self, field: Field, default: Option<u16>) -> Result<u16, ValidationError> {
        match (self.get(field), default) {
            (None, Some(default)) => Ok(default),
            (None, None) => Err(ValidationError::MissingField(field)),
            (Some(FieldValue::Int(value)), _) => u16::try_from(*value)
                .map_err(|_| ValidationError::invalid(field, format!("{} is not a valid port", value))),
            (Some(other), _) => Err(ValidationError::invalid(
                field,
                format!("unexpected value {:?}", other),
            )),
        }
    }
}

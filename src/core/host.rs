/// Backend server rows of the mysql_servers table
use crate::error::{AdminError, AdminResult, ValidationError};
use crate::executor::AdminRow;
use crate::utils::quote_literal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_WEIGHT: u32 = 1;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 1000;

/// Upper bounds enforced by the proxy's own table constraints
pub const MAX_WEIGHT: u32 = 10_000_000;
pub const MAX_REPLICATION_LAG: u32 = 126_144_000;

/// Columns of the backend servers table, declared in canonical order.
///
/// The derived `Ord` follows declaration order, so any ordered collection
/// keyed by `Field` iterates in the same order the table lays out its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    HostgroupId,
    Hostname,
    Port,
    GtidPort,
    Status,
    Weight,
    Compression,
    MaxConnections,
    MaxReplicationLag,
    UseSsl,
    MaxLatencyMs,
    Comment,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::HostgroupId,
        Field::Hostname,
        Field::Port,
        Field::GtidPort,
        Field::Status,
        Field::Weight,
        Field::Compression,
        Field::MaxConnections,
        Field::MaxReplicationLag,
        Field::UseSsl,
        Field::MaxLatencyMs,
        Field::Comment,
    ];

    /// Column name as it appears in the admin tables
    pub fn column(self) -> &'static str {
        match self {
            Field::HostgroupId => "hostgroup_id",
            Field::Hostname => "hostname",
            Field::Port => "port",
            Field::GtidPort => "gtid_port",
            Field::Status => "status",
            Field::Weight => "weight",
            Field::Compression => "compression",
            Field::MaxConnections => "max_connections",
            Field::MaxReplicationLag => "max_replication_lag",
            Field::UseSsl => "use_ssl",
            Field::MaxLatencyMs => "max_latency_ms",
            Field::Comment => "comment",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Proxy-defined state of a backend server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostStatus {
    #[default]
    Online,
    OfflineSoft,
    OfflineHard,
    Shunned,
}

impl HostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HostStatus::Online => "ONLINE",
            HostStatus::OfflineSoft => "OFFLINE_SOFT",
            HostStatus::OfflineHard => "OFFLINE_HARD",
            HostStatus::Shunned => "SHUNNED",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ONLINE" => Ok(HostStatus::Online),
            "OFFLINE_SOFT" => Ok(HostStatus::OfflineSoft),
            "OFFLINE_HARD" => Ok(HostStatus::OfflineHard),
            "SHUNNED" => Ok(HostStatus::Shunned),
            _ => Err(ValidationError::invalid(
                Field::Status,
                format!("unknown status {:?}", s),
            )),
        }
    }
}

/// A typed value for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(u64),
    Flag(bool),
    Status(HostStatus),
    Text(String),
}

impl FieldValue {
    /// Render as a SQL literal. Strings are quoted, everything else is bare.
    pub fn to_sql(&self) -> String {
        match self {
            FieldValue::Int(value) => value.to_string(),
            FieldValue::Flag(flag) => u8::from(*flag).to_string(),
            FieldValue::Status(status) => quote_literal(status.as_str()),
            FieldValue::Text(text) => quote_literal(text),
        }
    }
}

/// Check a single column value against the table's constraints
pub fn check_value(field: Field, value: &FieldValue) -> Result<(), ValidationError> {
    match (field, value) {
        (Field::Hostname, FieldValue::Text(hostname)) => {
            if hostname.is_empty() {
                return Err(ValidationError::invalid(field, "must not be empty"));
            }
            if let Some(bad) = hostname
                .chars()
                .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '\'' | '"' | '`'))
            {
                return Err(ValidationError::invalid(
                    field,
                    format!("contains forbidden character {:?}", bad),
                ));
            }
            Ok(())
        }
        (Field::Comment, FieldValue::Text(comment)) => {
            if comment.contains('\0') {
                return Err(ValidationError::invalid(field, "contains a NUL byte"));
            }
            Ok(())
        }
        (Field::Weight, FieldValue::Int(weight)) if *weight > MAX_WEIGHT as u64 => Err(
            ValidationError::invalid(field, format!("{} exceeds {}", weight, MAX_WEIGHT)),
        ),
        (Field::MaxReplicationLag, FieldValue::Int(lag)) if *lag > MAX_REPLICATION_LAG as u64 => {
            Err(ValidationError::invalid(
                field,
                format!("{} exceeds {}", lag, MAX_REPLICATION_LAG),
            ))
        }
        (Field::Port | Field::GtidPort, FieldValue::Int(port)) if *port > u16::MAX as u64 => Err(
            ValidationError::invalid(field, format!("{} is not a valid port", port)),
        ),
        (Field::Status, FieldValue::Status(_)) | (Field::UseSsl, FieldValue::Flag(_)) => Ok(()),
        (
            Field::HostgroupId
            | Field::Port
            | Field::GtidPort
            | Field::Weight
            | Field::Compression
            | Field::MaxConnections
            | Field::MaxReplicationLag
            | Field::MaxLatencyMs,
            FieldValue::Int(value),
        ) if *value <= u32::MAX as u64 => Ok(()),
        _ => Err(ValidationError::invalid(
            field,
            format!("unexpected value {:?}", value),
        )),
    }
}

/// One fully specified row of the backend servers table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    #[serde(default)]
    pub hostgroup_id: u32,
    pub hostname: String,
    pub port: u16,
    #[serde(default)]
    pub gtid_port: u16,
    #[serde(default)]
    pub status: HostStatus,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub compression: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub max_replication_lag: u32,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub max_latency_ms: u32,
    #[serde(default)]
    pub comment: String,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl Host {
    /// A host in hostgroup 0 with every optional column at its default
    pub fn new<S: Into<String>>(hostname: S, port: u16) -> Self {
        Self {
            hostgroup_id: 0,
            hostname: hostname.into(),
            port,
            gtid_port: 0,
            status: HostStatus::Online,
            weight: DEFAULT_WEIGHT,
            compression: 0,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_replication_lag: 0,
            use_ssl: false,
            max_latency_ms: 0,
            comment: String::new(),
        }
    }

    pub fn with_hostgroup_id(mut self, hostgroup_id: u32) -> Self {
        self.hostgroup_id = hostgroup_id;
        self
    }

    /// Validate every column, reporting the first offending field
    pub fn valid(&self) -> Result<(), ValidationError> {
        for field in Field::ALL {
            check_value(field, &self.value(field))?;
        }
        Ok(())
    }

    /// Typed value of one column
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::HostgroupId => FieldValue::Int(self.hostgroup_id.into()),
            Field::Hostname => FieldValue::Text(self.hostname.clone()),
            Field::Port => FieldValue::Int(self.port.into()),
            Field::GtidPort => FieldValue::Int(self.gtid_port.into()),
            Field::Status => FieldValue::Status(self.status),
            Field::Weight => FieldValue::Int(self.weight.into()),
            Field::Compression => FieldValue::Int(self.compression.into()),
            Field::MaxConnections => FieldValue::Int(self.max_connections.into()),
            Field::MaxReplicationLag => FieldValue::Int(self.max_replication_lag.into()),
            Field::UseSsl => FieldValue::Flag(self.use_ssl),
            Field::MaxLatencyMs => FieldValue::Int(self.max_latency_ms.into()),
            Field::Comment => FieldValue::Text(self.comment.clone()),
        }
    }

    pub fn columns(&self) -> Vec<&'static str> {
        Field::ALL.iter().map(|field| field.column()).collect()
    }

    /// Rendered literals, positionally paired with [`Host::columns`]
    pub fn values(&self) -> Vec<String> {
        Field::ALL
            .iter()
            .map(|field| self.value(*field).to_sql())
            .collect()
    }

    /// Exact-match predicate over all 12 columns.
    ///
    /// The table has no surrogate key, so a row is only addressed when every
    /// column matches.
    pub fn where_predicate(&self) -> String {
        Field::ALL
            .iter()
            .map(|field| format!("{}={}", field.column(), self.value(*field).to_sql()))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn set_weight(&mut self, weight: u32) {
        self.weight = weight;
    }

    /// Decode one row in the fixed 12-column order of the servers table
    pub fn from_row(row: &AdminRow) -> AdminResult<Self> {
        if row.len() != Field::ALL.len() {
            return Err(AdminError::decode(format!(
                "expected {} columns, got {}",
                Field::ALL.len(),
                row.len()
            )));
        }

        let use_ssl = match row.parse::<u8>(9, Field::UseSsl)? {
            0 => false,
            1 => true,
            other => {
                return Err(AdminError::decode(format!(
                    "use_ssl must be 0 or 1, got {}",
                    other
                )))
            }
        };
        let status = row
            .text(4, Field::Status)?
            .parse::<HostStatus>()
            .map_err(|e| AdminError::decode(e.to_string()))?;

        Ok(Self {
            hostgroup_id: row.parse(0, Field::HostgroupId)?,
            hostname: row.text(1, Field::Hostname)?.to_string(),
            port: row.parse(2, Field::Port)?,
            gtid_port: row.parse(3, Field::GtidPort)?,
            status,
            weight: row.parse(5, Field::Weight)?,
            compression: row.parse(6, Field::Compression)?,
            max_connections: row.parse(7, Field::MaxConnections)?,
            max_replication_lag: row.parse(8, Field::MaxReplicationLag)?,
            use_ssl,
            max_latency_ms: row.parse(10, Field::MaxLatencyMs)?,
            comment: row.text(11, Field::Comment)?.to_string(),
        })
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hg={} {}:{} status={} weight={} max_conn={} max_lag={} ssl={}",
            self.hostgroup_id,
            self.hostname,
            self.port,
            self.status,
            self.weight,
            self.max_connections,
            self.max_replication_lag,
            u8::from(self.use_ssl),
        )?;
        if !self.comment.is_empty() {
            write!(f, " comment={:?}", self.comment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::unquote_literal;

    fn sample_host() -> Host {
        Host {
            hostgroup_id: 2,
            hostname: "db-replica-1".to_string(),
            port: 3307,
            gtid_port: 0,
            status: HostStatus::OfflineSoft,
            weight: 10,
            compression: 0,
            max_connections: 200,
            max_replication_lag: 30,
            use_ssl: true,
            max_latency_ms: 50,
            comment: "rack b, it's slow".to_string(),
        }
    }

    // Turn rendered literals back into the text cells the admin interface returns
    fn as_row(host: &Host) -> AdminRow {
        AdminRow::new(
            host.values()
                .into_iter()
                .map(|literal| Some(unquote_literal(&literal).unwrap_or(literal)))
                .collect(),
        )
    }

    #[test]
    fn test_field_order_is_canonical() {
        let mut sorted = Field::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Field::ALL.to_vec());
        assert_eq!(Field::ALL[0].column(), "hostgroup_id");
        assert_eq!(Field::ALL[11].column(), "comment");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("ONLINE".parse::<HostStatus>().unwrap(), HostStatus::Online);
        assert_eq!(
            "offline_hard".parse::<HostStatus>().unwrap(),
            HostStatus::OfflineHard
        );
        assert_eq!(HostStatus::Shunned.to_string(), "SHUNNED");
        assert!("DRAINING".parse::<HostStatus>().is_err());
    }

    #[test]
    fn test_new_host_defaults() {
        let host = Host::new("db1", 3306);
        assert_eq!(host.hostgroup_id, 0);
        assert_eq!(host.status, HostStatus::Online);
        assert_eq!(host.weight, 1);
        assert_eq!(host.max_connections, 1000);
        assert_eq!(host.comment, "");
        assert!(host.valid().is_ok());
    }

    #[test]
    fn test_valid_rejects_bad_fields() {
        let mut host = sample_host();
        host.hostname = String::new();
        assert_eq!(
            host.valid(),
            Err(ValidationError::invalid(Field::Hostname, "must not be empty"))
        );

        let mut host = sample_host();
        host.hostname = "db1; DROP".to_string();
        assert!(matches!(
            host.valid(),
            Err(ValidationError::InvalidField { field: Field::Hostname, .. })
        ));

        let mut host = sample_host();
        host.weight = MAX_WEIGHT + 1;
        assert!(matches!(
            host.valid(),
            Err(ValidationError::InvalidField { field: Field::Weight, .. })
        ));

        let mut host = sample_host();
        host.max_replication_lag = MAX_REPLICATION_LAG + 1;
        assert!(matches!(
            host.valid(),
            Err(ValidationError::InvalidField { field: Field::MaxReplicationLag, .. })
        ));

        let mut host = sample_host();
        host.comment = "nul\0".to_string();
        assert!(matches!(
            host.valid(),
            Err(ValidationError::InvalidField { field: Field::Comment, .. })
        ));
    }

    #[test]
    fn test_columns_and_values_pair_up() {
        let host = sample_host();
        let columns = host.columns();
        let values = host.values();
        assert_eq!(columns.len(), 12);
        assert_eq!(values.len(), 12);
        assert_eq!(columns[1], "hostname");
        assert_eq!(values[1], "'db-replica-1'");
        assert_eq!(values[4], "'OFFLINE_SOFT'");
        assert_eq!(values[9], "1");
        assert_eq!(values[11], "'rack b, it''s slow'");
    }

    #[test]
    fn test_where_predicate_covers_every_column() {
        let predicate = sample_host().where_predicate();
        assert_eq!(predicate.matches(" AND ").count(), 11);
        assert!(predicate.starts_with("hostgroup_id=2 AND hostname='db-replica-1' AND port=3307"));
        assert!(predicate.ends_with("max_latency_ms=50 AND comment='rack b, it''s slow'"));
    }

    #[test]
    fn test_predicate_survives_row_round_trip() {
        let mut edge_cases = vec![sample_host(), Host::new("db1", 3306)];

        let mut extremes = Host::new("10.0.0.1", u16::MAX).with_hostgroup_id(u32::MAX);
        extremes.gtid_port = u16::MAX;
        extremes.compression = u32::MAX;
        extremes.max_connections = u32::MAX;
        extremes.max_latency_ms = u32::MAX;
        extremes.weight = MAX_WEIGHT;
        extremes.max_replication_lag = MAX_REPLICATION_LAG;
        extremes.status = HostStatus::Shunned;
        edge_cases.push(extremes);

        for comment in [r"C:\path\to", "réplica ünïcode ✓", "line one\nline two", "''", "0"] {
            let mut host = sample_host();
            host.use_ssl = false;
            host.comment = comment.to_string();
            edge_cases.push(host);
        }

        for host in edge_cases {
            assert!(host.valid().is_ok(), "{:?}", host);
            let decoded = Host::from_row(&as_row(&host)).unwrap();
            assert_eq!(decoded, host);
            assert_eq!(decoded.where_predicate(), host.where_predicate());
        }
    }

    #[test]
    fn test_from_row_rejects_bad_rows() {
        let short = AdminRow::new(vec![Some("1".to_string())]);
        assert!(matches!(Host::from_row(&short), Err(AdminError::Decode { .. })));

        let mut cells: Vec<Option<String>> = as_row(&sample_host()).into_cells();
        cells[2] = Some("not-a-port".to_string());
        assert!(Host::from_row(&AdminRow::new(cells.clone())).is_err());

        cells[2] = Some("3306".to_string());
        cells[9] = Some("2".to_string());
        assert!(Host::from_row(&AdminRow::new(cells.clone())).is_err());

        cells[9] = Some("0".to_string());
        cells[11] = None;
        assert!(Host::from_row(&AdminRow::new(cells)).is_err());
    }

    #[test]
    fn test_set_weight() {
        let mut host = sample_host();
        host.set_weight(50);
        assert_eq!(host.weight, 50);
    }

    #[test]
    fn test_host_deserialize_defaults() {
        let host: Host = toml::from_str("hostname = \"db1\"\nport = 3306\nstatus = \"SHUNNED\"").unwrap();
        assert_eq!(host.status, HostStatus::Shunned);
        assert_eq!(host.weight, DEFAULT_WEIGHT);
        assert_eq!(host.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(!host.use_ssl);
    }
}

use chrono::{DateTime, Utc};

/// One row of the `devices` table. Nested message objects are flattened to
/// scalar columns; the schedule stays a JSONB document to preserve entry
/// order verbatim.
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub uuid: String,
    pub auth_name: Option<String>,
    pub auth_role: Option<String>,
    pub auth_owner: Option<String>,
    pub company: Option<String>,
    pub device_name: Option<String>,
    pub device_version: Option<String>,
    pub schedule: serde_json::Value,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub reported_at: DateTime<Utc>,
}

impl DeviceRow {
    /// Maps a query row. Column order must match `SELECT_COLUMNS` in the
    /// repository.
    pub fn from_row(row: &tokio_postgres::Row) -> Self {
        Self {
            uuid: row.get(0),
            auth_name: row.get(1),
            auth_role: row.get(2),
            auth_owner: row.get(3),
            company: row.get(4),
            device_name: row.get(5),
            device_version: row.get(6),
            schedule: row.get(7),
            longitude: row.get(8),
            latitude: row.get(9),
            reported_at: row.get(10),
        }
    }
}

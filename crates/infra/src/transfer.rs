//! Data portability: export/import files, backup snapshots, and the local
//! record of the last successful backup.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use pizzapos_core::{BlobStore, StorageResult};
use pizzapos_orders::{Order, OrdersDocument};

/// Blob key of the last backup instant (RFC 3339).
pub const LAST_BACKUP_KEY: &str = "pizzaShopLastBackup";
/// Blob key of the identity the last backup was written under.
pub const BACKUP_UID_KEY: &str = "pizzaShopBackupUid";

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid import file: {0}")]
    InvalidFormat(String),

    #[error("no data to backup")]
    NothingToBackup,
}

/// Millisecond-precision UTC timestamp, e.g. `2024-03-13T12:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Export file: `{exportDate, appVersion, data: {orders, orderCounter}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub export_date: String,
    pub app_version: String,
    pub data: OrdersDocument,
}

impl ExportEnvelope {
    pub fn new(data: OrdersDocument, exported_at: DateTime<Utc>, app_version: impl Into<String>) -> Self {
        Self {
            export_date: iso_timestamp(exported_at),
            app_version: app_version.into(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Parse an import file: an export envelope, or a bare `{orders, orderCounter}`
/// document.
pub fn parse_import(raw: &str) -> Result<OrdersDocument, TransferError> {
    let value: JsonValue =
        serde_json::from_str(raw).map_err(|e| TransferError::InvalidFormat(e.to_string()))?;

    let document = match value.get("data") {
        Some(data) if data.is_object() => data.clone(),
        _ => value,
    };
    if !document.get("orders").is_some_and(JsonValue::is_array) {
        return Err(TransferError::InvalidFormat("missing orders array".to_string()));
    }
    serde_json::from_value(document).map_err(|e| TransferError::InvalidFormat(e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: String,
    pub platform: String,
}

impl DeviceInfo {
    /// Describes this process: crate name/version and host OS/architecture.
    pub fn current() -> Self {
        Self {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

/// Document handed to the remote backup collaborator.
///
/// `backupTimestamp` is assigned by the receiving side and is always `null`
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub orders: Vec<Order>,
    pub order_counter: u64,
    pub backup_timestamp: Option<String>,
    pub client_timestamp: String,
    pub device_info: DeviceInfo,
}

impl BackupSnapshot {
    /// Fails with [`TransferError::NothingToBackup`] when there has never
    /// been an order.
    pub fn capture(
        document: OrdersDocument,
        taken_at: DateTime<Utc>,
        device_info: DeviceInfo,
    ) -> Result<Self, TransferError> {
        if document.orders.is_empty() && document.order_counter == 0 {
            return Err(TransferError::NothingToBackup);
        }
        Ok(Self {
            orders: document.orders,
            order_counter: document.order_counter,
            backup_timestamp: None,
            client_timestamp: iso_timestamp(taken_at),
            device_info,
        })
    }
}

/// What a completed backup reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupReceipt {
    pub uid: String,
    pub timestamp: String,
    pub orders_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub timestamp: Option<String>,
    pub uid: Option<String>,
    pub has_backup: bool,
}

/// Remember a successful backup of `orders_count` orders under `uid`.
pub fn record_backup<S: BlobStore + ?Sized>(
    store: &S,
    uid: &str,
    orders_count: usize,
    at: DateTime<Utc>,
) -> StorageResult<BackupReceipt> {
    let timestamp = iso_timestamp(at);
    store.save(BACKUP_UID_KEY, uid)?;
    store.save(LAST_BACKUP_KEY, &timestamp)?;
    Ok(BackupReceipt {
        uid: uid.to_string(),
        timestamp,
        orders_count,
    })
}

/// Last recorded backup; unreadable or missing entries read as absent.
pub fn last_backup_info<S: BlobStore + ?Sized>(store: &S) -> BackupInfo {
    let read = |key: &str| store.load(key).ok().flatten().filter(|v| !v.is_empty());
    let timestamp = read(LAST_BACKUP_KEY);
    BackupInfo {
        has_backup: timestamp.is_some(),
        timestamp,
        uid: read(BACKUP_UID_KEY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pizzapos_core::{InMemoryBlobStore, OrderId};
    use pizzapos_orders::{NewOrder, OrderItem};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap()
    }

    fn document() -> OrdersDocument {
        let order = Order::create(
            NewOrder::new(vec![OrderItem::new("Tuna (L)", 220)]),
            OrderId::new(1_710_331_200_000),
            4,
            1_710_331_200_000,
            "19:00:00",
        )
        .unwrap();
        OrdersDocument {
            orders: vec![order],
            order_counter: 4,
        }
    }

    #[test]
    fn export_envelope_shape() {
        let envelope = ExportEnvelope::new(document(), at(), "1.2.0");
        let json: JsonValue = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(json["exportDate"], "2024-03-13T12:00:00.000Z");
        assert_eq!(json["appVersion"], "1.2.0");
        assert_eq!(json["data"]["orderCounter"], 4);
        assert_eq!(json["data"]["orders"][0]["price"], 220);
    }

    #[test]
    fn import_accepts_envelope_or_bare_document() {
        let envelope = ExportEnvelope::new(document(), at(), "1.2.0").to_json().unwrap();
        assert_eq!(parse_import(&envelope).unwrap(), document());

        let bare = serde_json::to_string(&document()).unwrap();
        assert_eq!(parse_import(&bare).unwrap(), document());

        let legacy = r#"{"orders":[{"id":5,"orderNo":1,"timestamp":5,"items":[{"name":"Bianca","price":"140"}],"price":140,"served":true,"paid":true}],"orderCounter":1}"#;
        let doc = parse_import(legacy).unwrap();
        assert_eq!(doc.orders[0].items()[0].price, 140);
    }

    #[test]
    fn import_rejects_garbage() {
        for raw in ["not json", "{}", r#"{"data":{"orders":5}}"#, r#"{"orders":[{"id":"x"}]}"#] {
            match parse_import(raw) {
                Err(TransferError::InvalidFormat(_)) => {}
                other => panic!("expected InvalidFormat for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn backup_snapshot_shape() {
        let device = DeviceInfo {
            user_agent: "test-agent".into(),
            platform: "test".into(),
        };
        let snapshot = BackupSnapshot::capture(document(), at(), device).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["backupTimestamp"].is_null());
        assert_eq!(json["clientTimestamp"], "2024-03-13T12:00:00.000Z");
        assert_eq!(json["deviceInfo"]["userAgent"], "test-agent");
        assert_eq!(json["orderCounter"], 4);

        match BackupSnapshot::capture(OrdersDocument::default(), at(), DeviceInfo::current()) {
            Err(TransferError::NothingToBackup) => {}
            other => panic!("expected NothingToBackup, got {other:?}"),
        }
    }

    #[test]
    fn backup_bookkeeping() {
        let store = InMemoryBlobStore::new();
        assert_eq!(last_backup_info(&store), BackupInfo::default());

        let receipt = record_backup(&store, "device-1", 3, at()).unwrap();
        assert_eq!(receipt.orders_count, 3);
        let info = last_backup_info(&store);
        assert!(info.has_backup);
        assert_eq!(info.uid.as_deref(), Some("device-1"));
        assert_eq!(info.timestamp.as_deref(), Some("2024-03-13T12:00:00.000Z"));

        store.fail_writes(true);
        assert!(record_backup(&store, "device-2", 3, at()).is_err());
    }
}

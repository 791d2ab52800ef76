//! Infrastructure layer: file persistence, configuration, import/export and
//! backup formats, and the runtime that wires the services together.

pub mod config;
pub mod file_store;
pub mod runtime;
pub mod transfer;


pub use config::PosConfig;
pub use file_store::FileBlobStore;
pub use runtime::PosRuntime;
pub use transfer::{
    BackupInfo, BackupReceipt, BackupSnapshot, DeviceInfo, ExportEnvelope, TransferError, parse_import,
};

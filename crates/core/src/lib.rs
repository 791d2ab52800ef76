//! `pizzapos-core`: shared building blocks for the point-of-sale domain.
//!
//! Identifiers, the error model, the clock abstraction and the key/value blob
//! store contract that repositories persist through.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod store;

pub use clock::{Clock, ManualClock, ShopZone, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, StorageError, StorageResult};
pub use id::OrderId;
pub use store::{BlobStore, InMemoryBlobStore};

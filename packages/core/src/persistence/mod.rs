//! Persistence layer: snapshot serialization, the async gateway boundary, and
//! the HTTP write contract.

pub mod gateway;
pub mod http;
pub mod snapshot;

pub use gateway::{FileSnapshotGateway, SnapshotGateway};
pub use snapshot::{SnapshotFile, SnapshotRecord};

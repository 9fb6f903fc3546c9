//! `mendline-core` — domain foundation for the repair-order pipeline.
//!
//! This crate contains **pure domain** types (no I/O): the repair/delivery
//! status taxonomy, the total status-mapping function, and the order
//! data-transfer types parsed at the proxy boundary.

pub mod error;
pub mod order;
pub mod status;

pub use error::{DomainError, DomainResult};
pub use order::{OrderImage, OrderRecord, OrderView};
pub use status::{OrderStatus, RepairStage, canonical_codes, canonical_position, progress_fraction};

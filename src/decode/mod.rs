//! Decoding and caching of per-type metadata.

mod cache;
mod entity;
pub mod keys;
mod transfer;

pub use cache::{CacheStats, MetadataCache};
pub use entity::{EntityDescriptor, KeyComponent};
pub use keys::{copy_keys_back, extract_keys_in_order};
pub use transfer::{KeyFieldBinding, TransferDescriptor};

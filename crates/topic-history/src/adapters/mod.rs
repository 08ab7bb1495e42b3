//! # Adapters Layer (Hexagonal Architecture)
//!
//! `MessageStore` implementations over the two driver families, and
//! in-memory drivers.

pub mod bucketed;
pub mod memory;
pub mod windowed;

pub use bucketed::BucketedMessageStore;
pub use memory::{InMemoryAclSource, InMemoryBucketStore, InMemoryWindowStore, DEFAULT_INSERT_TTL};
pub use windowed::WindowedMessageStore;

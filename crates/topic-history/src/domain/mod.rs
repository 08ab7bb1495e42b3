//! # Domain Module
//!
//! Core domain types for topic history retrieval.

pub mod bucket;
pub mod context;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod topic;
pub mod value_objects;

pub use bucket::*;
pub use context::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use value_objects::*;

//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod aggregator;
pub mod authorizer;
pub mod service;

pub use aggregator::HistoryAggregator;
pub use authorizer::TopicAuthorizer;
pub use service::HistoryService;

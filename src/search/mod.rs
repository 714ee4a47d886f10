pub mod cache;
pub mod pipeline;
pub mod query;
pub mod ranking;

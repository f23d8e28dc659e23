pub mod cache;
pub mod csv;
pub mod error;
pub mod publisher;
pub mod store;

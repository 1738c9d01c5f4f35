pub mod handlers;
pub mod ingest;
#[cfg(test)]
pub mod memory_store;
pub mod results;
pub mod store;
pub mod tracker;

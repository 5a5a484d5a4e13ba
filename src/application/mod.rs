// Application layer - Use cases and the seams adapters plug into
pub mod dataset_source;
pub mod history_store;
pub mod ingest;
pub mod session;
pub mod simulator;

// Infrastructure layer - External dependencies and adapters
pub mod blob_store;
pub mod config;
pub mod local_source;
pub mod remote_source;

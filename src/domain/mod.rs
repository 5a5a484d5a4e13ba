// Domain layer - Core business entities and pure functions
pub mod alarm;
pub mod dashboard;
pub mod dataset;
pub mod equipment;
pub mod filter;
pub mod summary;

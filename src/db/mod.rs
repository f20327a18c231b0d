pub mod changes;
pub mod models;
pub mod queries;

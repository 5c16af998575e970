pub mod checkpoint;
pub mod config;
pub mod models;
pub mod protocol;

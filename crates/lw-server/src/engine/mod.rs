pub mod ingest;
pub mod simulator;

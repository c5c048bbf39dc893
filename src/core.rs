pub mod ingest;
pub mod monitor;
pub mod policy;
pub mod position;
pub mod quarter;
pub mod record;

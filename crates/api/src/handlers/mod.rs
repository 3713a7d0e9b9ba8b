pub mod ingest;
pub mod queue;
pub mod shipments;

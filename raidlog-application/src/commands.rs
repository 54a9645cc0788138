pub mod catalog_commands;
pub mod ingest_commands;
pub mod store_commands;

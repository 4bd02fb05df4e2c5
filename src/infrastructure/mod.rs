// Infrastructure layer - External dependencies and adapters
pub mod catalog_schema;
pub mod config;
pub mod encryption;
pub mod excel_reader;
pub mod postgres_repository;
pub mod sqlite_repository;
pub mod telemetry;

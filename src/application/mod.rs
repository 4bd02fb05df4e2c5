// Application layer - Use cases over the catalog and data sources
pub mod catalog_repository;
pub mod dashboard_service;
pub mod dataset_service;
pub mod error;
pub mod gateway;
pub mod upload_service;

// Domain layer - Catalog records and tabular values
pub mod dashboard;
pub mod dataset;
pub mod tabular;

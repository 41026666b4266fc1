/// measurement_service: HTTP API for timestamped sensor-style readings.
///
/// # Module structure
///
/// ```text
/// measurement_service
/// ├── model     — shared data types (Measurement, Field, MeasurementPoint)
/// ├── error     — ApiError taxonomy (ValidationError / NoData / ServerError)
/// ├── validate  — query parameter validation (fields, dates, pagination)
/// ├── config    — service settings (service.toml + environment)
/// ├── db        — database connection and schema bootstrap
/// ├── store     — SQL for range queries, aggregation, and ingestion
/// └── endpoint  — tiny_http server, routing, JSON responses
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod store;
pub mod validate;

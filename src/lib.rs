//! Generation-mix forecasting, supply adequacy and synthetic heat fields.

/// Yearly adequacy index against modeled peak demand.
pub mod adequacy;
/// TOML run configuration, presets and validation.
pub mod config;
/// Per-source trend extrapolation.
pub mod forecast;
/// Region polygon and sampling lattice.
pub mod geo;
/// Seeded spatial heat field over the region lattice.
pub mod heat;
/// Historical generation tables read from CSV.
pub mod ingest;
/// CSV and GeoJSON output writers.
pub mod io;
/// Historical plus forecast generation table.
pub mod mix;
/// End-to-end rebuild from a history source.
pub mod pipeline;
/// Post-run summary figures.
pub mod report;

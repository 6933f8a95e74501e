//! The compression pipeline: from named curves to a validated blob.
//!
//! `precision` resolves a tolerance per curve, `builder` resamples curves into
//! uniform tracks, `planner` decides per-track storage, and `compressor` writes
//! the blob that `artifact` reads back.

pub mod artifact;
pub mod builder;
pub mod compressor;
pub mod error_metric;
pub mod planner;
pub mod precision;

//! Lightweight experiment tracking.
//!
//! Each run gets a directory `runs/<id>/` in an object store holding
//! its metadata, resolved parameters, logged result rows and text artifacts.

mod error;
mod experiment;
mod params;

pub use error::{Result, TrackerError};
pub use experiment::{
    CommandOutput, Experiment, ExperimentMetadata, ExperimentStatus, ResultRow, load_metadata,
    load_results,
};
pub use params::Params;

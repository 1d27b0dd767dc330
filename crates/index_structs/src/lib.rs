//! Common structs for index recommendations and workload runs shared across crates.

mod direction;
mod index_spec;
mod namespace;
mod sample;

pub use direction::*;
pub use index_spec::*;
pub use namespace::*;
pub use sample::*;

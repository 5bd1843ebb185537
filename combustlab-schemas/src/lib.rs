//! Shared data model for the combustion lab analyzer.
//!
//! Everything in this crate is plain data: fuel and appliance catalogues, the per-run
//! input form, derived energy results, aggregation records and the YAML settings file.
//! The computations that produce or consume these types live in `combustlab-core`.

pub mod columns;
pub mod file_formats;
pub mod fuel;
pub mod run;
pub mod summary;

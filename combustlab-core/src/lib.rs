//! Combustion lab run pipeline.
//!
//! - [`energy`]: lower heating values, total energy and PM emission factor.
//! - [`loader`] and [`table`]: reading instrument exports and writing run files.
//! - [`normalize`]: canonical column names and the fuel mass-loss rate.
//! - [`naming`] and [`recorder`]: run-numbered file names and the save cycle.
//! - [`aggregate`]: confidence-interval summaries and combined multi-run tables.

pub mod aggregate;
pub mod energy;
pub mod error;
pub mod loader;
pub mod naming;
pub mod normalize;
pub mod recorder;
pub mod settings;
pub mod table;

//! Stencil core library — values, parameter namespace, configuration.
//!
//! Public API surface:
//! - [`value`] — the dynamic [`Value`] exchanged with generated programs
//! - [`params`] — the [`Params`] namespace with default-absent reads
//! - [`options`] — immutable per-call [`Options`]
//! - [`error`] — [`ParamsError`]

pub mod error;
pub mod options;
pub mod params;
pub mod value;

pub use error::ParamsError;
pub use options::Options;
pub use params::Params;
pub use value::Value;

//! Processing stages of the ocean phenology pipeline
//!
//! [`stages`] holds the per-pixel algorithms and their grid drivers, [`source`] the
//! access to daily input fields and [`pipeline`] the file-level runners that chain the
//! stages through their persisted outputs.

pub mod pipeline;
#[cfg(feature = "python")]
pub mod python;
pub mod source;
pub mod stages;

pub use pipeline::{run_stages, Stage};
pub use source::{DailyField, DailyFieldSource, DirectorySource, MemorySource};

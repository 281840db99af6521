//! File I/O, validation, and serialization for the canopy pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::ExperimentName;
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::ResultWriter;

//! Run output sinks

pub mod annotations;
pub mod writer;

pub use writer::OutputWriter;

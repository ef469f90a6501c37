//! The converter driver: command-line parsing and the stage pipeline.

mod cli;
mod pipeline;

pub use pipeline::Driver;

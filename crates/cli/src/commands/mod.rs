//! CLI command implementations.

mod helpers;
mod report;

pub use helpers::{default_output_file, RunSettings};
pub use report::report;

#[cfg(test)]
mod tests;

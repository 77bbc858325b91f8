//! Command-line interface module.

mod args;
pub mod build;
pub mod transform;

pub use args::{Cli, Commands};

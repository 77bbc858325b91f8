//! Utility modules.

pub mod exec;
pub mod hash;
pub mod path;
pub mod plural;

//! Shared utilities: filesystem, hashing, subprocess execution.

pub mod fs;
pub mod hash;
pub mod process;

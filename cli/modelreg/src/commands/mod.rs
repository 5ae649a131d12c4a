//! CLI command implementations.

pub mod aliases;
pub mod init;
pub mod models;
pub mod versions;

//! Command implementations

pub mod attach;
pub mod config;
pub mod console;
pub mod ps;
pub mod version;

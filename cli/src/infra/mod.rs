//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process discovery, the
//! HotSpot attach protocol, signals, TCP probes, the HTTP service client, terminal
//! prompts and the config file.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod hotspot;
pub mod hsperf;
pub mod network;
pub mod prompt;
pub mod service_client;
pub mod signal;

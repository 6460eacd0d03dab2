//! # dirsync-core
//!
//! Shared foundations for the dirsync workspace: the common error type used by
//! both directory adapters and the immutable configuration value passed into
//! their constructors.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use config::SyncConfig;
pub use error::{Error, Result};

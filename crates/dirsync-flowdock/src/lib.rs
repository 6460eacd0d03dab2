//! Flowdock contact-list client.
//!
//! Fetches the organization's full user listing over the Flowdock REST API
//! and caches it as a snapshot keyed by email address.

#![deny(missing_docs)]

mod client;
mod models;

pub use client::{ContactDirectory, FlowdockClient, FlowdockClientBuilder, DEFAULT_BASE_URL};
pub use models::{Contact, ContactRecord, ContactSnapshot};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirsync_core::Result<T>;

//! LDAP directory client for FreeIPA user synchronization.
//!
//! This crate provides a typed facade over a FreeIPA-style directory: a
//! structured distinguished-name parser, a uniform attribute value model, and
//! a client that snapshots the active-user subtree and exposes lookup, add
//! and modify operations plus a tabular report.

#![deny(missing_docs)]

mod client;
mod config;
mod dn;
mod entry;
mod report;
mod user;

pub use client::{DirectoryClient, DirectoryModification, RawEntry, SearchScope};
pub use config::LdapConfig;
pub use dn::{DistinguishedName, DistinguishedNameError, Rdn};
pub use entry::{AttrValue, DirectoryEntry, DirectorySnapshot};
pub use user::{NewUser, UserCategory};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirsync_core::Result<T>;

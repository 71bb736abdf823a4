//! GitHub API access.
//!
//! This module provides the collaborator traits the engine depends on
//! and the reqwest-based implementation used in production.

pub mod api;
pub mod client;
#[cfg(test)]
pub mod fake;
pub mod types;

pub use api::{AppApi, InstallationApi, PAGE_SIZE};
pub use client::{ClientSettings, GitHubApp};

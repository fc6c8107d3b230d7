//! Core types for slnbake: build discovery, tool resolution and the setup
//! lifecycle that runs before any task.
//!
//! The crate is runtime-agnostic about *where* tools come from: downloads,
//! release lookups and installation detection sit behind the traits in
//! [`tools`], implemented by the `slnbake-tools-*` crates.

pub mod config;
mod error;
pub mod host;
pub mod lifecycle;
pub mod paths;
#[cfg(test)]
mod test_logs;
pub mod tools;

pub use config::{BuildConfiguration, BuildOptions, ToolOverrides};
pub use error::{Error, Result};
pub use host::{HostCapabilities, Os};
pub use lifecycle::{Lifecycle, LifecycleState, Providers};

//! # bake - Convention-driven C/C++ builder
//!
//! bake builds a C/C++ tree with no per-target build files. It scans every
//! source, infers the include graph, reads a one-line annotation at the top
//! of each file to decide what gets linked, and rebuilds exactly what is stale.
//!
//! ## Features
//!
//! - **Head tags**: `//! exe app`, `//! lib util`, `//! pch` on a file's first line
//! - **Include graph**: quoted includes resolved by relative path or path suffix
//! - **Incremental**: transitive timestamps, config changes and same-run rebuilds
//! - **Parallel Builds**: bounded batches on all CPU cores
//!
//! ## Quick Start
//!
//! ```bash
//! bake init
//! bake build
//! ```
//!
//! ## Module Organization
//!
//! - [`project`] - Scanning, classification and dependency resolution
//! - [`build`] - Staleness, templating, scheduling and the build driver
//! - [`config`] - Configuration parsing (`bake.toml`)
//! - [`tree`] - Dependency tree rendering

/// Core build system with parallel compilation.
pub mod build;

/// Configuration file parsing (`bake.toml`).
pub mod config;

/// Error type shared by scanning and building.
pub mod error;

/// Source tree model: files, include graph, language adapter.
pub mod project;

/// Dependency tree visualization.
pub mod tree;

pub use error::BuildError;

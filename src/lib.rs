//! Core of a screen-reader plugin that reports CPU and memory usage of the
//! currently focused application on demand.
//!
//! The host runtime supplies two primitives, modelled as traits in [`host`]:
//! "which process owns the focused UI element" and "speak this text". The OS
//! sits behind [`system::query::ProcessQuery`], with a `sysinfo`-backed
//! implementation. Everything in between — process tree collection, throttled
//! CPU sampling, aggregation, and spoken-string formatting — lives here and is
//! driven by [`plugin::ResourceReporter`].

pub mod config;
pub mod error;
pub mod format;
pub mod host;
pub mod plugin;
pub mod report;
pub mod system;

//! Pacifica: signed trading client for the Pacifica perpetual-futures venue
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace. For actual functionality, use the individual crates:
//!
//! - `pacifica-core`: signing, typed requests and responses, HTTP client
//! - `pacifica-cli`: the `pacifica` command-line binary

// Re-export for benchmarks
pub use pacifica_core as core;

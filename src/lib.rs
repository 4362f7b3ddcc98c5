//! `rundmd-rs` is a library for reading, editing, and rebuilding the binary
//! images used by the RunDMD pinball display controller.
//!
//! The codec itself lives in the [`rundmd_types`] crate; this facade
//! re-exports it so downstream tools can depend on a single crate.

pub use rundmd_types::*;

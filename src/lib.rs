//! Shikumi core library.
//!
//! Building blocks of a meta-build generator: a deterministic graph
//! sequencer, toolchain flavor detection backed by compiler predefine probing,
//! Xcode build-setting emulation, and Ninja naming and query helpers.

pub mod cli;
pub mod graph;
pub mod ninja;
pub mod runner;
pub mod spec;
pub mod toolchain;
pub mod xcode;

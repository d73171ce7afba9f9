//! Error types for the runner module.
//!
//! Kept in their own file so the lint suppression needed by the derive macros
//! stays narrowly scoped.

// The unused_assignments lint fires in some Rust versions on miette/thiserror
// derive expansions and not in others, so `#[expect]` cannot be used.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading command inputs.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The input file could not be read.
    #[error("cannot read {path}")]
    #[diagnostic(code(shikumi::runner::read_input))]
    ReadInput {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The input file is not valid JSON of the expected shape.
    #[error("cannot parse {path}")]
    #[diagnostic(
        code(shikumi::runner::parse_input),
        help("inputs are JSON documents; see `shikumi help` for the expected shape")
    )]
    ParseInput {
        /// File that was parsed.
        path: Utf8PathBuf,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
}

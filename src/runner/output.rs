//! Writing command results to standard output.
//!
//! A closed pipe (`shikumi order graph.json | head -1`) is not an error.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_all_ignoring_broken_pipe(writer: &mut impl Write, buf: &[u8]) -> io::Result<()> {
    match writer.write_all(buf) {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

fn flush_ignoring_broken_pipe(writer: &mut impl Write) -> io::Result<()> {
    match writer.flush() {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

/// Write `line` and a newline to `writer`.
pub(super) fn write_line(writer: &mut impl Write, line: &str) -> Result<()> {
    write_all_ignoring_broken_pipe(writer, line.as_bytes()).context("write to stdout")?;
    write_all_ignoring_broken_pipe(writer, b"\n").context("write to stdout")?;
    flush_ignoring_broken_pipe(writer).context("flush stdout")?;
    Ok(())
}

/// Write `value` as pretty JSON to `writer`.
pub(super) fn write_json(writer: &mut impl Write, value: &impl Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render JSON output")?;
    write_line(writer, &rendered)
}

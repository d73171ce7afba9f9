//! Host platform capabilities used when invoking toolchain binaries.
//!
//! Everything that differs between POSIX hosts and Windows (null device,
//! command dispatch, path separators inside compiler variables, argument
//! quoting) is answered here so callers never branch on `cfg!(windows)`
//! themselves.
//!
//! # Windows quoting
//!
//! Commands dispatched through `cmd /C` pass two parsers. Each argument is
//! first quoted for [`CommandLineToArgvW`][ms-argv]: arguments containing
//! whitespace or double quotes are wrapped in quotes, embedded quotes become
//! `\"` and backslashes run before a quote are doubled. The resulting line is
//! then walked with `cmd.exe`'s own quote state, which flips on every `"`,
//! and [metacharacters][ss64] that `cmd.exe` would see outside quotes get a
//! `^`. Nothing inside quotes is rewritten, so the program receives its
//! arguments byte for byte. A `%NAME%` inside quotes still expands when
//! `NAME` is defined because `cmd.exe` offers no escape there. Line breaks are
//! rejected because `cmd.exe` treats them as command terminators even inside
//! quotes.
//!
//! [ms-argv]: https://learn.microsoft.com/windows/win32/api/shellapi/nf-shellapi-commandlinetoargvw
//! [ss64]: https://ss64.com/nt/syntax-esc.html

use std::borrow::Cow;

use shell_quote::{QuoteRefExt, Sh};
use thiserror::Error;

/// How a command line reaches the operating system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Spawn the program directly with an argument vector.
    Direct,
    /// Hand a quoted command line to the platform shell.
    Shell,
}

/// Raised when an argument cannot be represented on a shell command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// The argument contains a carriage return or line feed.
    #[error("arguments containing carriage returns or line feeds cannot be safely quoted")]
    ContainsLineBreak,
}

/// Host platform families with distinct process conventions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    /// Unix-like hosts: `/dev/null`, direct spawning, `sh` quoting.
    Posix,
    /// Windows hosts: no null device path, `cmd /C` dispatch, backslash paths.
    Windows,
}

impl Platform {
    /// Select the variant matching the running host.
    #[must_use]
    pub const fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }

    /// Path of a device that reads as empty, if the platform has one usable
    /// as a compiler input.
    #[must_use]
    pub const fn null_device(self) -> Option<&'static str> {
        match self {
            Self::Posix => Some("/dev/null"),
            Self::Windows => None,
        }
    }

    /// Native dispatch mode for toolchain commands.
    ///
    /// Windows needs the shell so compiler paths containing spaces resolve the
    /// same way they do from a developer prompt.
    #[must_use]
    pub const fn dispatch(self) -> Dispatch {
        match self {
            Self::Posix => Dispatch::Direct,
            Self::Windows => Dispatch::Shell,
        }
    }

    /// Shell program and leading arguments used for [`Dispatch::Shell`].
    #[must_use]
    pub const fn shell(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Posix => ("sh", &["-c"]),
            Self::Windows => ("cmd", &["/C"]),
        }
    }

    /// Rewrite backslash separators to forward slashes on Windows.
    ///
    /// Backslashes inside compiler variables are path separators on Windows,
    /// never escapes, so they are normalised before shell-style splitting.
    #[must_use]
    pub fn normalise_separators(self, raw: &str) -> Cow<'_, str> {
        match self {
            Self::Windows if raw.contains('\\') => Cow::Owned(raw.replace('\\', "/")),
            Self::Posix | Self::Windows => Cow::Borrowed(raw),
        }
    }

    /// Split a command string into tokens, honouring double-quoted substrings.
    ///
    /// Returns `None` when quotes are unbalanced.
    #[must_use]
    pub fn split_command(self, raw: &str) -> Option<Vec<String>> {
        shlex::split(&self.normalise_separators(raw))
    }

    /// Quote `arg` for this platform's shell.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::ContainsLineBreak`] when `arg` contains `\r` or
    /// `\n`.
    pub fn quote_arg(self, arg: &str) -> Result<String, QuoteError> {
        if arg.chars().any(|ch| matches!(ch, '\n' | '\r')) {
            return Err(QuoteError::ContainsLineBreak);
        }
        Ok(match self {
            Self::Posix => quote_sh(arg),
            Self::Windows => quote_cmd(arg),
        })
    }

    /// Join `argv` into one shell command line.
    ///
    /// # Errors
    ///
    /// Propagates [`QuoteError`] from any argument.
    pub fn join_command_line(self, argv: &[String]) -> Result<String, QuoteError> {
        let quoted = argv
            .iter()
            .map(|arg| self.quote_arg(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(quoted.join(" "))
    }

    /// Command line handed to [`Platform::shell`] for `argv`.
    ///
    /// `cmd /C` strips the first and last quote of its payload when the line
    /// starts with one, so the Windows line is wrapped in an extra pair.
    ///
    /// # Errors
    ///
    /// Propagates [`QuoteError`] from any argument.
    pub fn shell_payload(self, argv: &[String]) -> Result<String, QuoteError> {
        let line = self.join_command_line(argv)?;
        Ok(match self {
            Self::Posix => line,
            Self::Windows => format!("\"{line}\""),
        })
    }
}

fn quote_sh(arg: &str) -> String {
    let bytes = arg.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug_assert!(false, "quoted args must be valid UTF-8: {err}");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

fn quote_cmd(arg: &str) -> String {
    escape_cmd_metacharacters(&quote_argv(arg))
}

fn quote_argv(arg: &str) -> String {
    if !arg.is_empty() && !arg.chars().any(|ch| matches!(ch, ' ' | '\t' | '"')) {
        return arg.to_owned();
    }

    let mut buf = String::with_capacity(arg.len() + 2);
    buf.push('"');
    let mut backslashes = 0_usize;
    for ch in arg.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' => {
                buf.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                buf.push('"');
                backslashes = 0;
            }
            _ => {
                buf.extend(std::iter::repeat_n('\\', backslashes));
                buf.push(ch);
                backslashes = 0;
            }
        }
    }
    // The closing quote must not be escaped by a trailing backslash run.
    buf.extend(std::iter::repeat_n('\\', backslashes * 2));
    buf.push('"');
    buf
}

fn escape_cmd_metacharacters(line: &str) -> String {
    let mut buf = String::with_capacity(line.len());
    let mut in_quotes = false;
    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes
            && matches!(ch, '^' | '&' | '|' | '<' | '>' | '(' | ')' | '%' | '!')
        {
            buf.push('^');
        }
        buf.push(ch);
    }
    buf
}

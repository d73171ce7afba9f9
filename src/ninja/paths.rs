//! Build directory resolution through capability handles.

use std::io::{self, ErrorKind};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Make `dir` absolute against the current directory and check that it opens
/// as a directory.
///
/// Symlinks and `..` components are left for the operating system to resolve,
/// so the result names the same directory the relative path did from the
/// caller's cwd.
pub(crate) fn absolute_build_dir(dir: &Utf8Path) -> io::Result<Utf8PathBuf> {
    let joined = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        current_dir_utf8()?.join(dir)
    };
    let absolute: Utf8PathBuf = joined
        .components()
        .filter(|component| !matches!(component, Utf8Component::CurDir))
        .collect();
    Dir::open_ambient_dir(&absolute, ambient_authority())?;
    Ok(absolute)
}

fn current_dir_utf8() -> io::Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("current directory {} is not valid UTF-8", path.display()),
        )
    })
}

//! JSON input loading through capability handles.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::RunnerError;

/// Read and decode the JSON document at `path`.
pub(super) fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, RunnerError> {
    let read_error = |source| RunnerError::ReadInput {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path does not name a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let text = dir.read_to_string(name).map_err(read_error)?;
    debug!(%path, bytes = text.len(), "loaded input");
    serde_json::from_str(&text).map_err(|source| RunnerError::ParseInput {
        path: path.to_path_buf(),
        source,
    })
}

//! Fake toolchain executables written as shell scripts.
//!
//! Scripts validate the arguments they receive and print canned output, so
//! integration tests exercise real process spawning without a compiler or
//! Ninja installed.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;
use tempfile::TempDir;

/// A script in its own temporary directory.
#[derive(Debug)]
pub struct FakeTool {
    /// Keeps the script alive.
    pub dir: TempDir,
    /// Path of the script.
    pub path: Utf8PathBuf,
    /// File the script appends each received argument to, one per line.
    pub log: Utf8PathBuf,
}

impl FakeTool {
    /// Arguments received by the most recent runs, in order.
    pub fn recorded_args(&self) -> Result<Vec<String>> {
        if !self.log.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.log)
            .with_context(|| format!("read argument log {}", self.log))?;
        Ok(text.lines().map(str::to_owned).collect())
    }
}

/// Make a script file executable on Unix platforms.
#[cfg(unix)]
fn make_script_executable(path: &Path, context: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .with_context(|| format!("{context}: read metadata {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("{context}: set permissions {}", path.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_script_executable(_path: &Path, _context: &str) -> Result<()> {
    Ok(())
}

fn write_script(name: &str, body: &str, context: &str) -> Result<FakeTool> {
    let dir = TempDir::new().with_context(|| format!("{context}: create temp dir"))?;
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name))
        .map_err(|p| anyhow!("{context}: non-UTF-8 path {}", p.display()))?;
    let log = Utf8PathBuf::from_path_buf(dir.path().join("args.log"))
        .map_err(|p| anyhow!("{context}: non-UTF-8 path {}", p.display()))?;
    let mut file =
        File::create(&path).with_context(|| format!("{context}: create script {path}"))?;
    let script = body.replace("@LOG@", log.as_str());
    write!(file, "#!/bin/sh\n{script}")
        .with_context(|| format!("{context}: write script {path}"))?;
    drop(file);
    make_script_executable(path.as_std_path(), context)?;
    Ok(FakeTool { dir, path, log })
}

/// A compiler that logs its arguments and prints `output`.
pub fn fake_compiler(output: &str) -> Result<FakeTool> {
    let body = format!(
        "for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '@LOG@'; done\n\
         cat <<'SHIKUMI_EOF'\n{output}\nSHIKUMI_EOF\n"
    );
    write_script("cc", &body, "fake_compiler")
}

/// A tool that logs its arguments and exits with `code`.
pub fn fake_failing_tool(code: i32, stderr: &str) -> Result<FakeTool> {
    let body = format!(
        "for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '@LOG@'; done\n\
         printf '%s\\n' '{stderr}' >&2\n\
         exit {code}\n"
    );
    write_script("tool", &body, "fake_failing_tool")
}

/// A Ninja that answers `-C <dir> -t compdb cc cxx objc objcxx` with one
/// entry whose directory is `<dir>`, and exits `2` for anything else.
pub fn fake_ninja_compdb() -> Result<FakeTool> {
    let body = "for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '@LOG@'; done\n\
        [ \"$1\" = \"-C\" ] || exit 2\n\
        [ \"$3 $4\" = \"-t compdb\" ] || exit 2\n\
        [ \"$5 $6 $7 $8\" = \"cc cxx objc objcxx\" ] || exit 2\n\
        printf '[{\"directory\": \"%s\", \"command\": \"cc my.in my.out\", \"file\": \"my.in\", \"output\": \"my.out\"}]\\n' \"$2\"\n";
    write_script("ninja", body, "fake_ninja_compdb")
}

/// A Ninja that prints `output` for any arguments.
pub fn fake_ninja_printing(output: &str) -> Result<FakeTool> {
    let body = format!("cat <<'SHIKUMI_EOF'\n{output}\nSHIKUMI_EOF\n");
    write_script("ninja", &body, "fake_ninja_printing")
}

use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::{Result, ShellError};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// How an external interpreter invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalOutcome {
    /// The interpreter exited on its own. Non-zero codes are not errors here:
    /// the interpreter has already printed its own diagnostics.
    Exited(ExitCode),
    /// The user interrupted the command.
    Interrupted,
}

/// The command processor that receives lines nothing else claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalInterpreter {
    path: PathBuf,
}

impl ExternalInterpreter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The flag that makes the interpreter run a single command string.
    pub fn command_flag(&self) -> &'static str {
        let stem = self
            .path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_ascii_lowercase();
        match stem.as_str() {
            "pwsh" | "powershell" => "-Command",
            "cmd" => "/C",
            _ => "-c",
        }
    }

    /// Resolve the configured path to an executable, searching `PATH` for bare names.
    pub fn locate(&self, env: &Environment) -> Result<PathBuf> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        find_command_path(OsStr::new(&search_paths), &self.path)
            .map(Cow::into_owned)
            .ok_or_else(|| ShellError::InterpreterNotFound(self.path.clone()))
    }

    /// Run `command_line` and wait for it.
    ///
    /// The child inherits the terminal, the shell's variables and its current
    /// directory.
    pub fn run(&self, command_line: &str, env: &Environment) -> Result<ExternalOutcome> {
        let executable = self.locate(env)?;
        log::debug!("external: {} {} {command_line:?}", executable.display(), self.command_flag());

        let status = std::process::Command::new(&executable)
            .arg(self.command_flag())
            .arg(command_line)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .status()?;

        Ok(match status.code() {
            Some(code) => ExternalOutcome::Exited(code),
            None if interrupted(status) => ExternalOutcome::Interrupted,
            None => ExternalOutcome::Exited(terminated_by_signal(status)),
        })
    }
}

#[cfg(unix)]
fn interrupted(exit_status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    // SIGINT
    exit_status.signal() == Some(2)
}

#[cfg(not(unix))]
fn interrupted(_exit_status: ExitStatus) -> bool {
    false
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.exists())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env as stdenv;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the variable that remembers the directory left by the last `cd`.
pub const OLDPWD: &str = "OLDPWD";

/// Mutable, user-level view of the process environment used by the shell.
///
/// The environment contains:
/// - `vars`: variables handed to every external interpreter invocation.
/// - `current_dir`: the working directory, kept in sync with the process.
/// - `should_exit`: set by the `exit` builtin; the prompt loop checks it after
///   every line.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME, OLDPWD).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// When set to true, the interactive loop terminates after the current line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The user's home directory, preferring `HOME` from `vars`.
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.vars
            .get("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }

    /// The directory left by the last successful [`Environment::change_dir`].
    pub fn previous_dir(&self) -> Option<PathBuf> {
        self.vars.get(OLDPWD).map(PathBuf::from)
    }

    /// Expand a leading `~` to the home directory.
    pub fn expand_tilde(&self, raw: &str) -> PathBuf {
        expand_tilde_with(raw, self.home_dir().as_deref())
    }

    /// Change the working directory of the shell and the process.
    ///
    /// Relative targets resolve against `current_dir`. On success `OLDPWD` is
    /// set to the directory that was left; on failure nothing changes.
    pub fn change_dir(&mut self, target: &Path) -> Result<()> {
        let new_dir = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("No such directory: {}", new_dir.display()))?;
        if !canonical.is_dir() {
            anyhow::bail!("Not a directory: {}", canonical.display());
        }

        stdenv::set_current_dir(&canonical)
            .with_context(|| format!("Error changing directory to {}", canonical.display()))?;
        let previous = std::mem::replace(&mut self.current_dir, canonical);
        self.set_var(OLDPWD, previous.to_string_lossy());
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand a leading `~` (alone or followed by a separator) against `home`.
pub(crate) fn expand_tilde_with(raw: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_current_dir;

    fn bare_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
            should_exit: false,
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = bare_env();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE".to_string()));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_expand_tilde() {
        let home = Path::new("/home/devi");
        assert_eq!(expand_tilde_with("~", Some(home)), PathBuf::from("/home/devi"));
        assert_eq!(
            expand_tilde_with("~/src", Some(home)),
            PathBuf::from("/home/devi/src")
        );
        assert_eq!(expand_tilde_with("~other", Some(home)), PathBuf::from("~other"));
        assert_eq!(expand_tilde_with("~/src", None), PathBuf::from("~/src"));
    }

    #[test]
    fn test_change_dir_sets_oldpwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let canonical_temp = fs::canonicalize(temp.path()).unwrap();

        let mut env = bare_env();
        env.change_dir(&canonical_temp).unwrap();

        assert_eq!(env.current_dir, canonical_temp);
        assert_eq!(env.previous_dir(), Some(orig.clone()));
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn test_change_dir_missing_target_leaves_state() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = bare_env();

        let res = env.change_dir(Path::new("nonexistent_dir_for_devishell_test"));

        assert!(res.is_err());
        assert_eq!(env.previous_dir(), None);
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }
}

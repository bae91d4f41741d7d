//! Cached environment facts shown in the prompt, and the prompt text itself.

use crate::config::Config;
use crate::env::Environment;
use anyhow::{Result, bail};
use chrono::NaiveTime;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Snapshot of what the prompt displays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    pub cwd: PathBuf,
    pub vcs_branch: Option<String>,
    pub vcs_dirty: bool,
    pub vcs_ahead: usize,
    pub vcs_behind: usize,
    pub venv_label: Option<String>,
}

/// Version control facts about a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsStatus {
    pub branch: String,
    pub dirty: bool,
    pub ahead: usize,
    pub behind: usize,
}

/// Queries the repository enclosing a directory.
pub trait VcsSource {
    /// Fails when `dir` is not inside a repository or the query fails.
    fn status(&self, dir: &Path) -> Result<VcsStatus>;
}

/// Asks the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl GitCli {
    fn git(dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        if !output.status.success() {
            bail!("git {} failed", args.join(" "));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn ahead_behind(dir: &Path, branch: &str) -> Result<(usize, usize)> {
        let range = format!("origin/{branch}...{branch}");
        let counts = Self::git(dir, &["rev-list", "--left-right", "--count", &range])?;
        let mut parts = counts.split_whitespace().map(str::parse::<usize>);
        match (parts.next(), parts.next()) {
            (Some(Ok(behind)), Some(Ok(ahead))) => Ok((ahead, behind)),
            _ => bail!("unexpected rev-list output: {counts}"),
        }
    }
}

impl VcsSource for GitCli {
    fn status(&self, dir: &Path) -> Result<VcsStatus> {
        let branch = Self::git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch.is_empty() || branch == "HEAD" {
            bail!("detached HEAD");
        }
        let dirty = !Self::git(dir, &["status", "--porcelain", "--untracked-files=no"])?.is_empty();
        // No upstream counts as level with it.
        let (ahead, behind) = Self::ahead_behind(dir, &branch).unwrap_or((0, 0));
        Ok(VcsStatus {
            branch,
            dirty,
            ahead,
            behind,
        })
    }
}

/// Lazily refreshed [`PromptState`].
pub struct PromptStateCache {
    state: PromptState,
    vcs: Box<dyn VcsSource>,
    primed: bool,
}

impl PromptStateCache {
    pub fn new(vcs: Box<dyn VcsSource>) -> Self {
        Self {
            state: PromptState::default(),
            vcs,
            primed: false,
        }
    }

    pub fn state(&self) -> &PromptState {
        &self.state
    }

    /// Recompute the snapshot.
    ///
    /// Without `force` nothing happens unless the working directory moved since
    /// the last refresh. Returns whether the snapshot was recomputed. Never
    /// fails: any repository problem leaves the VCS fields at their defaults.
    pub fn refresh(&mut self, force: bool, env: &Environment, config: &Config) -> bool {
        let cwd = std::env::current_dir().unwrap_or_else(|_| env.current_dir.clone());
        if !force && self.primed && cwd == self.state.cwd {
            return false;
        }

        let mut state = PromptState {
            venv_label: env
                .get_var("VIRTUAL_ENV")
                .filter(|v| !v.is_empty())
                .and_then(|v| Path::new(&v).file_name().map(|n| n.to_string_lossy().into_owned())),
            ..PromptState::default()
        };

        if config.show_git {
            match self.vcs.status(&cwd) {
                Ok(vcs) => {
                    state.vcs_branch = Some(vcs.branch);
                    state.vcs_dirty = vcs.dirty;
                    state.vcs_ahead = vcs.ahead;
                    state.vcs_behind = vcs.behind;
                }
                Err(e) => log::debug!("no vcs status for {}: {e}", cwd.display()),
            }
        }

        state.cwd = cwd;
        self.state = state;
        self.primed = true;
        true
    }

    /// Refresh only if the working directory changed.
    pub fn invalidate_if_cwd_changed(&mut self, env: &Environment, config: &Config) -> bool {
        self.refresh(false, env, config)
    }
}

impl Default for PromptStateCache {
    fn default() -> Self {
        Self::new(Box::new(GitCli))
    }
}

impl std::fmt::Debug for PromptStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptStateCache")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// `cwd` with the home directory shown as `~`, left-truncated to `max` characters.
pub fn display_path(cwd: &Path, home: Option<&Path>, max: usize) -> String {
    let shown = match home.and_then(|h| cwd.strip_prefix(h).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~{}{}", std::path::MAIN_SEPARATOR, rest.display()),
        None => cwd.display().to_string(),
    };

    let len = shown.chars().count();
    if len <= max {
        return shown;
    }
    let keep = max.saturating_sub(3);
    let tail: String = shown.chars().skip(len - keep).collect();
    format!("...{tail}")
}

/// Render the prompt line.
pub fn render_prompt(
    state: &PromptState,
    config: &Config,
    home: Option<&Path>,
    now: NaiveTime,
) -> String {
    let mut prompt = String::from(" DeviShell ");

    if config.show_venv {
        if let Some(venv) = &state.venv_label {
            prompt.push_str(&format!("({venv}) "));
        }
    }

    let cwd = display_path(&state.cwd, home, config.max_path_length);
    prompt.push_str(&format!("[{cwd}] "));

    if config.show_git {
        if let Some(branch) = &state.vcs_branch {
            prompt.push_str(&format!("git:({branch})"));
            if state.vcs_dirty {
                prompt.push('*');
            }
            if state.vcs_ahead > 0 {
                prompt.push_str(&format!("↑{}", state.vcs_ahead));
            }
            if state.vcs_behind > 0 {
                prompt.push_str(&format!("↓{}", state.vcs_behind));
            }
            prompt.push(' ');
        }
    }

    if config.show_time {
        prompt.push_str(&format!("[{}]", now.format("%H:%M:%S")));
    }

    if !prompt.ends_with(' ') {
        prompt.push(' ');
    }
    prompt.push_str(&config.prompt_char);
    prompt.push(' ');
    prompt
}

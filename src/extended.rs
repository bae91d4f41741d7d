//! Commands registered outside the builtin set: configuration, bookmarks,
//! aliases, introspection, and a handful of file utilities.

use crate::command::{CommandDescriptor, CommandRegistry, ExitCode, ShellCommand, Tier};
use crate::config::THEMES;
use crate::context::ShellContext;
use crate::error::ShellError;
use crate::report;
use anyhow::{Context, Result};
use argh::FromArgs;
use regex::RegexBuilder;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::time::SystemTime;

/// Register every extended command.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(CommandDescriptor::of::<ConfigSet>(Tier::Extended));
    registry.register(CommandDescriptor::of::<ConfigGet>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Theme>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Bookmark>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Unbookmark>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Alias>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Unalias>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Plugins>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Help>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Cat>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Grep>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Touch>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Mkcd>(Tier::Extended));
    registry.register(CommandDescriptor::of::<Timestamp>(Tier::Extended));
}

/// Report the outcome of a store mutation that has already happened in memory.
fn report_persisted(
    out: &mut dyn Write,
    result: crate::error::Result<()>,
    success: String,
) -> Result<ExitCode> {
    match result {
        Ok(()) => {
            report::success(out, success)?;
            Ok(0)
        }
        Err(e) => {
            report::error(out, e)?;
            Ok(1)
        }
    }
}

#[derive(FromArgs)]
/// Set a configuration value.
pub struct ConfigSet {
    #[argh(positional)]
    /// option name.
    pub key: String,
    #[argh(positional)]
    /// new value.
    pub value: String,
}

impl ShellCommand for ConfigSet {
    fn name() -> &'static str {
        "config_set"
    }

    fn summary() -> &'static str {
        "Set a configuration value"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if let Err(e) = ctx.config.set(&self.key, &self.value) {
            report::error(out, e)?;
            return Ok(1);
        }
        report_persisted(
            out,
            ctx.save_config(),
            format!("Set {} = {}", self.key, self.value),
        )
    }
}

#[derive(FromArgs)]
/// Show one or all configuration values.
pub struct ConfigGet {
    #[argh(positional)]
    /// option name; all options when omitted.
    pub key: Option<String>,
}

impl ShellCommand for ConfigGet {
    fn name() -> &'static str {
        "config_get"
    }

    fn summary() -> &'static str {
        "Get configuration value(s)"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        match self.key {
            Some(key) => {
                let value = ctx.config.get(&key).unwrap_or_else(|| "Not set".to_string());
                writeln!(out, "{key}: {value}")?;
            }
            None => {
                let entries = ctx.config.entries();
                report::table(
                    out,
                    "Configuration",
                    ("Key", "Value"),
                    entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )?;
            }
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show or set the prompt theme.
pub struct Theme {
    #[argh(positional)]
    /// theme to switch to.
    pub name: Option<String>,
}

impl ShellCommand for Theme {
    fn name() -> &'static str {
        "theme"
    }

    fn summary() -> &'static str {
        "Set or list themes"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        let Some(name) = self.name else {
            writeln!(out, "Current theme: {}", ctx.config.theme)?;
            writeln!(out, "Available themes: {}", THEMES.join(", "))?;
            return Ok(0);
        };
        if !THEMES.contains(&name.as_str()) {
            report::error(out, format!("Unknown theme: {name}"))?;
            writeln!(out, "Available themes: {}", THEMES.join(", "))?;
            return Ok(1);
        }

        ctx.config.theme = name.clone();
        ctx.prompt.refresh(true, &ctx.env, &ctx.config);
        report_persisted(out, ctx.save_config(), format!("Theme set to: {name}"))
    }
}

#[derive(FromArgs)]
/// List bookmarks, or bookmark a directory (default: the current one).
pub struct Bookmark {
    #[argh(positional, greedy)]
    /// bookmark name, optionally followed by the directory to bookmark.
    pub args: Vec<String>,
}

impl ShellCommand for Bookmark {
    fn name() -> &'static str {
        "bookmark"
    }

    fn summary() -> &'static str {
        "Bookmark current or specified directory"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        let (name, path) = match self.args.as_slice() {
            [] => (None, None),
            [name] => (Some(name.clone()), None),
            [name, path] => (Some(name.clone()), Some(path.clone())),
            _ => {
                report::error(out, "Usage: bookmark [name [path]]")?;
                return Ok(1);
            }
        };
        let Some(name) = name else {
            if ctx.bookmarks.is_empty() {
                report::info(out, "No bookmarks saved")?;
            } else {
                report::table(
                    out,
                    "Bookmarks",
                    ("Name", "Path"),
                    ctx.bookmarks.list().iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )?;
            }
            return Ok(0);
        };

        let target = match &path {
            Some(p) => ctx.env.current_dir.join(ctx.env.expand_tilde(p)),
            None => ctx.env.current_dir.clone(),
        };
        let target = fs::canonicalize(&target).unwrap_or(target);

        match ctx.bookmarks.set(name.as_str(), &target) {
            Err(ShellError::NotADirectory(path)) => {
                report::error(out, format!("Not a directory: {}", path.display()))?;
                Ok(1)
            }
            result => report_persisted(
                out,
                result,
                format!("Bookmarked '{}' as '@{name}'", target.display()),
            ),
        }
    }
}

#[derive(FromArgs)]
/// Remove a bookmark.
pub struct Unbookmark {
    #[argh(positional)]
    /// bookmark name.
    pub name: String,
}

impl ShellCommand for Unbookmark {
    fn name() -> &'static str {
        "unbookmark"
    }

    fn summary() -> &'static str {
        "Remove a bookmark"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        match ctx.bookmarks.remove(&self.name) {
            Ok(false) => {
                report::error(out, format!("Bookmark not found: {}", self.name))?;
                Ok(1)
            }
            result => report_persisted(
                out,
                result.map(|_| ()),
                format!("Removed bookmark: {}", self.name),
            ),
        }
    }
}

#[derive(FromArgs)]
/// List aliases, show one, or define `name` as the rest of the line.
pub struct Alias {
    #[argh(positional, greedy)]
    /// alias name followed by the command it expands to.
    pub args: Vec<String>,
}

impl ShellCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn summary() -> &'static str {
        "Create or list command aliases"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        match self.args.as_slice() {
            [] => {
                if ctx.aliases.is_empty() {
                    report::info(out, "No aliases defined")?;
                } else {
                    report::table(
                        out,
                        "Aliases",
                        ("Alias", "Command"),
                        ctx.aliases.list().iter().map(|(k, v)| (k.as_str(), v.as_str())),
                    )?;
                }
                Ok(0)
            }
            [name] => match ctx.aliases.get(name) {
                Some(command) => {
                    writeln!(out, "{name}: {command}")?;
                    Ok(0)
                }
                None => {
                    report::error(out, format!("Alias not found: {name}"))?;
                    Ok(1)
                }
            },
            [name, command @ ..] => {
                let command = command.join(" ");
                let result = ctx.aliases.set(name.as_str(), command.as_str());
                report_persisted(out, result, format!("Created alias: {name} -> {command}"))
            }
        }
    }
}

#[derive(FromArgs)]
/// Remove an alias.
pub struct Unalias {
    #[argh(positional)]
    /// alias name.
    pub name: String,
}

impl ShellCommand for Unalias {
    fn name() -> &'static str {
        "unalias"
    }

    fn summary() -> &'static str {
        "Remove an alias"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        match ctx.aliases.remove(&self.name) {
            Ok(false) => {
                report::error(out, format!("Alias not found: {}", self.name))?;
                Ok(1)
            }
            result => report_persisted(
                out,
                result.map(|_| ()),
                format!("Removed alias: {}", self.name),
            ),
        }
    }
}

#[derive(FromArgs)]
/// List loaded plugins.
pub struct Plugins {}

impl ShellCommand for Plugins {
    fn name() -> &'static str {
        "plugins"
    }

    fn summary() -> &'static str {
        "List loaded plugins"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if ctx.plugins.is_empty() {
            report::info(out, "No plugins loaded")?;
            return Ok(0);
        }
        let rows: Vec<(String, String)> = ctx
            .plugins
            .iter()
            .map(|p| (p.name.clone(), p.path.display().to_string()))
            .collect();
        report::table(
            out,
            "Loaded Plugins",
            ("Name", "Path"),
            rows.iter().map(|(n, p)| (n.as_str(), p.as_str())),
        )?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show help for all commands or a single one.
pub struct Help {
    #[argh(positional)]
    /// command to describe.
    pub command: Option<String>,
}

impl ShellCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn summary() -> &'static str {
        "Show help for commands"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if let Some(command) = self.command {
            return match ctx.registry.lookup(&command) {
                Some(descriptor) => {
                    writeln!(out, "{}: {}", descriptor.name, descriptor.summary)?;
                    writeln!(out, "Run '{} --help' for its arguments.", descriptor.name)?;
                    Ok(0)
                }
                None => {
                    report::error(out, format!("Unknown command: {command}"))?;
                    Ok(1)
                }
            };
        }

        writeln!(out, "DeviShell: a command shell with aliases, bookmarks and plugins.")?;
        for (title, tier) in [
            ("Built-in Commands:", Tier::Builtin),
            ("Extended Commands:", Tier::Extended),
        ] {
            writeln!(out, "\n{title}")?;
            for descriptor in ctx.registry.tier(tier) {
                writeln!(out, "  • {:<12} {}", descriptor.name, descriptor.summary)?;
            }
        }
        writeln!(out, "\nUse 'help <command>' for detailed help")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// print file(s) to stdout
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to print.
    pub files: Vec<String>,
}

impl ShellCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn summary() -> &'static str {
        "Print file contents"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if self.files.is_empty() {
            report::error(out, "Usage: cat <file>...")?;
            return Ok(1);
        }
        for fname in self.files {
            let path = ctx.env.current_dir.join(ctx.env.expand_tilde(&fname));
            let mut f =
                fs::File::open(&path).map_err(|e| anyhow::anyhow!("cat: {}: {}", fname, e))?;
            std::io::copy(&mut f, out)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// print lines matching a pattern
pub struct Grep {
    #[argh(positional)]
    /// the pattern to search for (a regular expression)
    pub pattern: String,

    #[argh(positional, greedy)]
    /// files to search.
    pub files: Vec<String>,

    #[argh(switch, short = 'w')]
    /// match only whole words (using non-word characters as boundaries)
    pub word_regexp: bool,

    #[argh(switch, short = 'i')]
    /// ignore case distinctions
    pub ignore_case: bool,

    #[argh(option, short = 'A', default = "0")]
    /// print NUM lines of trailing context after matching lines
    pub after_context: usize,
}

impl Grep {
    fn process_source(
        &self,
        reader: &mut dyn Read,
        out: &mut dyn Write,
        file_name: &str,
        re: &regex::Regex,
    ) -> Result<()> {
        let lines = BufReader::new(reader)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()
            .context("read error")?;

        let mut to_print = vec![false; lines.len()];
        for (i, line) in lines.iter().enumerate() {
            if re.is_match(line) {
                let end = i
                    .saturating_add(self.after_context)
                    .saturating_add(1)
                    .min(lines.len());
                to_print[i..end].iter_mut().for_each(|p| *p = true);
            }
        }

        let mut last_printed: Option<usize> = None;
        for (i, line) in lines.iter().enumerate().filter(|(i, _)| to_print[*i]) {
            if self.after_context > 0 && last_printed.is_some_and(|last| i > last + 1) {
                writeln!(out, "--")?;
            }
            writeln!(out, "{file_name}:{line}")?;
            last_printed = Some(i);
        }
        Ok(())
    }
}

impl ShellCommand for Grep {
    fn name() -> &'static str {
        "grep"
    }

    fn summary() -> &'static str {
        "Search files for a regular expression"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if self.files.is_empty() {
            report::error(out, "Usage: grep [-i] [-w] [-A n] <pattern> <file>...")?;
            return Ok(1);
        }

        let pattern = if self.word_regexp {
            format!(r"\b({})\b", self.pattern)
        } else {
            self.pattern.clone()
        };
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(self.ignore_case)
            .build()
            .with_context(|| format!("Invalid regex pattern: {}", pattern))?;

        let mut final_exit_code = 0;
        for file_name in &self.files {
            let path = ctx.env.current_dir.join(ctx.env.expand_tilde(file_name));
            let result = fs::File::open(&path)
                .map_err(anyhow::Error::from)
                .and_then(|mut f| self.process_source(&mut f, out, file_name, &re));
            if let Err(e) = result {
                writeln!(out, "grep: {}: {}", file_name, e)?;
                final_exit_code = 1;
            }
        }
        Ok(final_exit_code)
    }
}

#[derive(FromArgs)]
/// Create files or update their modification time.
pub struct Touch {
    #[argh(positional, greedy)]
    /// files to touch.
    pub files: Vec<String>,
}

impl ShellCommand for Touch {
    fn name() -> &'static str {
        "touch"
    }

    fn summary() -> &'static str {
        "Create empty files or update timestamps"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if self.files.is_empty() {
            report::error(out, "Usage: touch <file>...")?;
            return Ok(1);
        }
        for fname in &self.files {
            let path = ctx.env.current_dir.join(ctx.env.expand_tilde(fname));
            let file = fs::File::options()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("touch: {fname}"))?;
            file.set_modified(SystemTime::now())
                .with_context(|| format!("touch: {fname}"))?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Create a directory (with parents) and change into it.
pub struct Mkcd {
    #[argh(positional)]
    /// directory to create.
    pub dir: String,
}

impl ShellCommand for Mkcd {
    fn name() -> &'static str {
        "mkcd"
    }

    fn summary() -> &'static str {
        "Create a directory and enter it"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        let target: PathBuf = ctx.env.current_dir.join(ctx.env.expand_tilde(&self.dir));
        fs::create_dir_all(&target)
            .with_context(|| format!("mkcd: cannot create {}", target.display()))?;
        ctx.env.change_dir(&target)?;
        report::success(out, format!("Created and entered {}", ctx.env.current_dir.display()))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show the current Unix timestamp.
pub struct Timestamp {}

impl ShellCommand for Timestamp {
    fn name() -> &'static str {
        "timestamp"
    }

    fn summary() -> &'static str {
        "Show current Unix timestamp"
    }

    fn execute(self, _ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        let now = chrono::Local::now();
        writeln!(out, "Timestamp: {}", now.timestamp())?;
        writeln!(out, "Human: {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lock_current_dir;
    use std::env as stdenv;

    fn run<T: ShellCommand>(cmd: T, ctx: &mut ShellContext) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = cmd.execute(ctx, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    fn alias(args: &[&str]) -> Alias {
        Alias {
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn alias_create_show_list_remove() {
        let mut ctx = ShellContext::in_memory();

        let (code, out) = run(alias(&[]), &mut ctx);
        assert_eq!((code, out.as_str()), (0, "ℹ No aliases defined\n"));

        let (code, out) = run(alias(&["ll", "ls", "-la"]), &mut ctx);
        assert_eq!(code, 0);
        assert_eq!(out, "✔ Created alias: ll -> ls -la\n");
        assert_eq!(ctx.aliases.get("ll"), Some("ls -la"));

        let (_, out) = run(alias(&["ll"]), &mut ctx);
        assert_eq!(out, "ll: ls -la\n");

        let (code, _) = run(Unalias { name: "ll".into() }, &mut ctx);
        assert_eq!(code, 0);
        let (code, out) = run(Unalias { name: "ll".into() }, &mut ctx);
        assert_eq!(code, 1);
        assert_eq!(out, "✖ Alias not found: ll\n");
    }

    #[test]
    fn bookmark_requires_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let mut ctx = ShellContext::in_memory();

        let (code, out) = run(
            Bookmark {
                args: vec!["f".into(), file.to_string_lossy().into_owned()],
            },
            &mut ctx,
        );
        assert_eq!(code, 1);
        assert!(out.starts_with("✖ Not a directory: "));

        let (code, _) = run(
            Bookmark {
                args: vec!["d".into(), dir.path().to_string_lossy().into_owned()],
            },
            &mut ctx,
        );
        assert_eq!(code, 0);
        let stored = ctx.bookmarks.get("d").unwrap();
        assert_eq!(PathBuf::from(stored), fs::canonicalize(dir.path()).unwrap());

        let (code, _) = run(Unbookmark { name: "d".into() }, &mut ctx);
        assert_eq!(code, 0);
        assert!(ctx.bookmarks.is_empty());
    }

    #[test]
    fn config_set_and_get() {
        let mut ctx = ShellContext::in_memory();

        let (code, out) = run(
            ConfigSet {
                key: "prompt_char".into(),
                value: "$".into(),
            },
            &mut ctx,
        );
        assert_eq!(code, 0);
        assert_eq!(out, "✔ Set prompt_char = $\n");

        let (_, out) = run(ConfigGet { key: Some("prompt_char".into()) }, &mut ctx);
        assert_eq!(out, "prompt_char: $\n");
        let (_, out) = run(ConfigGet { key: Some("missing".into()) }, &mut ctx);
        assert_eq!(out, "missing: Not set\n");

        let (code, _) = run(
            ConfigSet {
                key: "show_git".into(),
                value: "sometimes".into(),
            },
            &mut ctx,
        );
        assert_eq!(code, 1);
        assert!(ctx.config.show_git);
    }

    #[test]
    fn theme_rejects_unknown_names() {
        let mut ctx = ShellContext::in_memory();
        let (code, out) = run(Theme { name: Some("neon".into()) }, &mut ctx);
        assert_eq!(code, 1);
        assert!(out.starts_with("✖ Unknown theme: neon\n"));
        assert_eq!(ctx.config.theme, "default");
    }

    #[test]
    fn help_for_single_command() {
        let mut ctx = ShellContext::in_memory();
        let (code, out) = run(Help { command: Some("cd".into()) }, &mut ctx);
        assert_eq!(code, 0);
        assert!(out.starts_with("cd: Change directory"));

        let (code, out) = run(Help { command: None }, &mut ctx);
        assert_eq!(code, 0);
        assert!(out.contains("Built-in Commands:"));
        assert!(out.contains("unbookmark"));
    }

    #[test]
    fn test_grep_ignore_case_and_context() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, "Line 1\nMATCH 1\nLine 3\nLine 4\nmatch 2\nLine 6\n").unwrap();
        let filename = file.to_string_lossy().to_string();
        let mut ctx = ShellContext::in_memory();

        let grep = Grep {
            pattern: "match".to_string(),
            files: vec![filename.clone()],
            word_regexp: false,
            ignore_case: true,
            after_context: 1,
        };
        let (code, out) = run(grep, &mut ctx);

        assert_eq!(code, 0);
        assert_eq!(
            out,
            format!(
                "{f}:MATCH 1\n{f}:Line 3\n--\n{f}:match 2\n{f}:Line 6\n",
                f = filename
            )
        );
    }

    #[test]
    fn test_cat_and_touch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new.txt");
        let name = file.to_string_lossy().to_string();
        let mut ctx = ShellContext::in_memory();

        let (code, _) = run(Touch { files: vec![name.clone()] }, &mut ctx);
        assert_eq!(code, 0);
        assert!(file.exists());

        fs::write(&file, "hello\nworld\n").unwrap();
        let (code, out) = run(Cat { files: vec![name] }, &mut ctx);
        assert_eq!(code, 0);
        assert_eq!(out, "hello\nworld\n");
    }

    #[test]
    fn test_mkcd_creates_and_enters() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");
        let mut ctx = ShellContext::in_memory();

        let (code, _) = run(
            Mkcd {
                dir: target.to_string_lossy().into_owned(),
            },
            &mut ctx,
        );
        assert_eq!(code, 0);
        assert_eq!(ctx.env.current_dir, fs::canonicalize(&target).unwrap());

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
    }

    #[test]
    fn bookmark_parses_name_and_path_from_the_command_line() {
        let dir = tempfile::tempdir().unwrap();
        let target = fs::canonicalize(dir.path()).unwrap();
        let mut ctx = ShellContext::in_memory();
        let line = format!("bookmark proj {}", target.display());

        let mut out = Vec::new();
        let outcome = crate::router::dispatch_line(&mut ctx, &line, &mut out).unwrap();

        assert_eq!(
            outcome,
            crate::router::DispatchOutcome::Extended {
                name: "bookmark".into(),
                code: 0
            }
        );
        assert_eq!(ctx.bookmarks.get("proj"), Some(target.to_string_lossy().as_ref()));

        let (code, out) = run(Bookmark { args: vec![] }, &mut ctx);
        assert_eq!(code, 0);
        assert!(out.starts_with("Bookmarks\nName"));

        let (code, out) = run(
            Bookmark {
                args: vec!["a".into(), "b".into(), "c".into()],
            },
            &mut ctx,
        );
        assert_eq!(code, 1);
        assert_eq!(out, "✖ Usage: bookmark [name [path]]\n");
    }

    #[test]
    fn grep_with_huge_trailing_context_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, "miss\nhit\nafter\n").unwrap();
        let filename = file.to_string_lossy().to_string();
        let mut ctx = ShellContext::in_memory();

        let line = format!("grep -A {} hit {filename}", usize::MAX);
        let mut out = Vec::new();
        let outcome = crate::router::dispatch_line(&mut ctx, &line, &mut out).unwrap();

        assert_eq!(
            outcome,
            crate::router::DispatchOutcome::Extended {
                name: "grep".into(),
                code: 0
            }
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{f}:hit\n{f}:after\n", f = filename)
        );
    }
}

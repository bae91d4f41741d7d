use crate::command::{CommandDescriptor, CommandRegistry, ExitCode, ShellCommand, Tier};
use crate::context::ShellContext;
use crate::report;
use anyhow::Result;
use argh::FromArgs;
use std::io::Write;
use std::path::PathBuf;

/// Register the commands implemented by the shell loop itself.
pub fn register(registry: &mut CommandRegistry) {
    registry.register(CommandDescriptor::of::<Cd>(Tier::Builtin));
    registry.register(CommandDescriptor::of::<Exit>(Tier::Builtin));
    registry.register(CommandDescriptor::named::<Exit>("quit", Tier::Builtin));
    registry.register(CommandDescriptor::of::<Clear>(Tier::Builtin));
    registry.register(CommandDescriptor::named::<Clear>("cls", Tier::Builtin));
    registry.register(CommandDescriptor::of::<History>(Tier::Builtin));
}

#[derive(FromArgs)]
/// Change the current working directory.
/// Accepts a path, `@bookmark`, `-` for the previous directory, or nothing for $HOME.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute, relative, `~/...`, `@name` or `-`.
    pub target: Option<String>,
}

impl ShellCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn summary() -> &'static str {
        "Change directory (supports @bookmark, - and ~)"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        let target = match self.target.as_deref() {
            None | Some("") => match ctx.env.home_dir() {
                Some(home) => home,
                None => {
                    report::error(out, "cd: no target and HOME not set")?;
                    return Ok(1);
                }
            },
            Some("-") => match ctx.env.previous_dir() {
                Some(prev) => prev,
                None => {
                    report::error(out, "No previous directory")?;
                    return Ok(1);
                }
            },
            Some(t) if t.starts_with('@') => {
                let name = &t[1..];
                match ctx.bookmarks.get(name) {
                    Some(path) => {
                        report::info(out, format!("Jumping to bookmark: {name}"))?;
                        PathBuf::from(path)
                    }
                    None => {
                        report::error(out, format!("Bookmark not found: {name}"))?;
                        return Ok(1);
                    }
                }
            }
            Some(t) => ctx.env.expand_tilde(t),
        };

        ctx.env.change_dir(&target)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl ShellCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn summary() -> &'static str {
        "Exit DeviShell"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        writeln!(out, "Farewell from DeviShell.")?;
        ctx.env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Clear the screen.
pub struct Clear {}

impl ShellCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn summary() -> &'static str {
        "Clear the screen"
    }

    fn execute(self, _ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        write!(out, "\x1b[2J\x1b[H")?;
        out.flush()?;
        Ok(0)
    }
}

/// Lines shown by `history`.
const HISTORY_SHOWN: usize = 50;

#[derive(FromArgs)]
/// Show the commands entered in this session.
pub struct History {}

impl ShellCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn summary() -> &'static str {
        "Show command history"
    }

    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode> {
        if ctx.history.is_empty() {
            report::info(out, "No command history")?;
            return Ok(0);
        }
        let numbered: Vec<(String, &str)> = ctx
            .history
            .recent(HISTORY_SHOWN)
            .enumerate()
            .map(|(i, line)| ((i + 1).to_string(), line))
            .collect();
        report::table(
            out,
            "Command History",
            ("#", "Command"),
            numbered.iter().map(|(n, line)| (n.as_str(), *line)),
        )?;
        Ok(0)
    }
}

use crate::context::ShellContext;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// The capability bound to a command name.
///
/// Receives the shell context, the arguments after the command name and the
/// stream to print to.
pub type Handler = Rc<dyn Fn(&mut ShellContext, &[String], &mut dyn Write) -> Result<ExitCode>>;

/// Which namespace a command lives in. Builtins shadow extended commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Builtin,
    Extended,
}

/// A command parsed with [`argh`] and executed in-process.
pub trait ShellCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "alias".
    fn name() -> &'static str;

    /// One-line description shown by `help`.
    fn summary() -> &'static str;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, ctx: &mut ShellContext, out: &mut dyn Write) -> Result<ExitCode>;
}

/// Build the handler that parses arguments into `T` and runs it.
///
/// Argument errors print argh's usage text and yield 1; `--help` yields 0.
pub fn handler_for<T: ShellCommand + 'static>(name: &'static str) -> Handler {
    Rc::new(move |ctx: &mut ShellContext, args: &[String], out: &mut dyn Write| {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match T::from_args(&[name], &args) {
            Ok(cmd) => cmd.execute(ctx, out),
            Err(EarlyExit { output, status }) => {
                writeln!(out, "{}", output.trim_end())?;
                Ok(if status.is_err() { 1 } else { 0 })
            }
        }
    })
}

/// A name bound to a handler in one tier.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub summary: String,
    pub tier: Tier,
    pub handler: Handler,
}

impl CommandDescriptor {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        tier: Tier,
        handler: Handler,
    ) -> Self {
        Self {
            name: name.into().to_lowercase(),
            summary: summary.into(),
            tier,
            handler,
        }
    }

    /// Descriptor for an argh command under its canonical name.
    pub fn of<T: ShellCommand + 'static>(tier: Tier) -> Self {
        Self::named::<T>(T::name(), tier)
    }

    /// Descriptor for an argh command under an additional name (`quit` for `exit`).
    pub fn named<T: ShellCommand + 'static>(name: &'static str, tier: Tier) -> Self {
        Self::new(name, T::summary(), tier, handler_for::<T>(name))
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

/// Builtin and extended commands, keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    builtin: BTreeMap<String, CommandDescriptor>,
    extended: BTreeMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command to its tier, replacing a previous entry of the same tier.
    ///
    /// An extended command named like a builtin is accepted but can never be
    /// reached through [`CommandRegistry::lookup`].
    pub fn register(&mut self, descriptor: CommandDescriptor) {
        let tier = match descriptor.tier {
            Tier::Builtin => &mut self.builtin,
            Tier::Extended => {
                if self.builtin.contains_key(&descriptor.name) {
                    log::warn!(
                        "extended command '{}' is shadowed by a builtin",
                        descriptor.name
                    );
                }
                &mut self.extended
            }
        };
        tier.insert(descriptor.name.clone(), descriptor);
    }

    /// Resolve `name` (case-insensitive), builtins first.
    pub fn lookup(&self, name: &str) -> Option<&CommandDescriptor> {
        let key = name.to_lowercase();
        self.builtin
            .get(&key)
            .or_else(|| self.extended.get(&key))
    }

    /// Entries of one tier, sorted by name.
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &CommandDescriptor> {
        match tier {
            Tier::Builtin => self.builtin.values(),
            Tier::Extended => self.extended.values(),
        }
    }

    /// Every command name, sorted and without duplicates.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .builtin
            .keys()
            .chain(self.extended.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(code: ExitCode) -> Handler {
        Rc::new(
            move |_: &mut ShellContext, _: &[String], _: &mut dyn Write| -> Result<ExitCode> {
                Ok(code)
            },
        )
    }

    #[test]
    fn builtin_shadows_extended() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDescriptor::new("cd", "", Tier::Extended, noop(2)));
        registry.register(CommandDescriptor::new("cd", "", Tier::Builtin, noop(1)));

        let found = registry.lookup("cd").unwrap();
        assert_eq!(found.tier, Tier::Builtin);
        assert_eq!(registry.names(), ["cd"]);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDescriptor::new("Search", "", Tier::Extended, noop(0)));

        assert_eq!(registry.lookup("SEARCH").unwrap().name, "search");
        assert!(registry.lookup("serve").is_none());
    }

    #[test]
    fn names_are_sorted_union() {
        let mut registry = CommandRegistry::new();
        for name in ["sysinfo", "search", "serve"] {
            registry.register(CommandDescriptor::new(name, "", Tier::Extended, noop(0)));
        }
        registry.register(CommandDescriptor::new("exit", "", Tier::Builtin, noop(0)));

        assert_eq!(registry.names(), ["exit", "search", "serve", "sysinfo"]);
        assert_eq!(registry.tier(Tier::Builtin).count(), 1);
    }
}

use crate::completer::ShellHelper;
use crate::config::ShellPaths;
use crate::context::ShellContext;
use crate::builtin::Exit;
use crate::command::ShellCommand;
use crate::plugin::{LoadEvent, ModuleOpener, PluginLoader};
use crate::prompt::render_prompt;
use crate::report;
use crate::router::{self, DispatchOutcome};
use crate::script;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};
use std::io::{self, Write};

/// The interactive shell: a [`ShellContext`] plus the line editor loop around it.
///
/// Example
/// ```
/// use devishell::{Interpreter, ShellContext};
/// let mut sh = Interpreter::new(ShellContext::in_memory());
/// let mut out = Vec::new();
/// sh.run_line("alias ll ls -la", &mut out).unwrap();
/// assert_eq!(sh.context().aliases.get("ll"), Some("ls -la"));
/// ```
#[derive(Debug)]
pub struct Interpreter {
    ctx: ShellContext,
}

impl Interpreter {
    pub fn new(ctx: ShellContext) -> Self {
        Self { ctx }
    }

    /// Load the persisted state under `paths`.
    pub fn load(paths: ShellPaths) -> Self {
        Self::new(ShellContext::load(paths))
    }

    pub fn context(&self) -> &ShellContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut ShellContext {
        &mut self.ctx
    }

    /// Dispatch one line and refresh the prompt state if it moved the shell.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<DispatchOutcome> {
        let outcome = router::dispatch_line(&mut self.ctx, line, out)?;
        self.ctx
            .prompt
            .invalidate_if_cwd_changed(&self.ctx.env, &self.ctx.config);
        Ok(outcome)
    }

    /// Everything that happens before the first prompt: plugins, banner,
    /// startup script and the initial prompt state.
    pub fn startup<O: ModuleOpener>(
        &mut self,
        loader: &PluginLoader<O>,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        for event in self.ctx.load_plugins(loader) {
            match event {
                LoadEvent::Loaded(name) => report::success(out, format!("Loaded plugin: {name}"))?,
                LoadEvent::Failed(e) => report::error(out, format!("Failed to load {e}"))?,
            }
        }

        writeln!(out, "DeviShell v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(
            out,
            "Theme: {} | Type 'help' for assistance",
            self.ctx.config.theme
        )?;

        if let Some(script) = self.ctx.paths.as_ref().map(|p| p.startup_script.clone()) {
            script::run_startup_script(&mut self.ctx, &script, out)?;
        }

        self.ctx
            .prompt
            .refresh(true, &self.ctx.env, &self.ctx.config);
        Ok(())
    }

    /// End of input always leaves, whatever `exit` has been aliased to. Nothing
    /// is recorded in the history.
    pub fn end_of_input(&mut self, out: &mut dyn Write) -> anyhow::Result<()> {
        Exit { _args: Vec::new() }.execute(&mut self.ctx, out)?;
        Ok(())
    }

    fn prompt(&self) -> String {
        render_prompt(
            self.ctx.prompt.state(),
            &self.ctx.config,
            self.ctx.env.home_dir().as_deref(),
            chrono::Local::now().time(),
        )
    }

    /// Read-eval-print until `exit`, `quit` or end of input.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let config = EditorConfig::builder()
            .max_history_size(self.ctx.config.history_size)?
            .auto_add_history(false)
            .build();
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(ShellHelper {
            completer: self.ctx.completer(),
        }));

        let history_file = self.ctx.paths.as_ref().map(|p| p.history.clone());
        if let Some(path) = history_file.as_deref().filter(|p| p.exists()) {
            if let Err(e) = rl.load_history(path) {
                log::warn!("cannot read history {}: {e}", path.display());
            }
        }

        let mut out = io::stdout();
        while !self.ctx.env.should_exit {
            let line = match rl.readline(&self.prompt()) {
                Ok(line) => line,
                // Ctrl-C discards the line being edited.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    self.end_of_input(&mut out)?;
                    break;
                }
                Err(err) => return Err(err.into()),
            };

            if !line.trim().is_empty() {
                rl.add_history_entry(line.as_str())?;
                if let Some(path) = &history_file {
                    if let Err(e) = rl.append_history(path) {
                        log::warn!("cannot append history {}: {e}", path.display());
                    }
                }
            }

            self.run_line(&line, &mut out)?;
            out.flush()?;
            if let Some(helper) = rl.helper_mut() {
                helper.completer = self.ctx.completer();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::NativeOpener;
    use crate::plugin::tests::ScriptedOpener;
    use std::fs;

    #[test]
    fn startup_runs_script_and_primes_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ShellPaths::under(dir.path());
        paths.ensure().unwrap();
        fs::write(&paths.startup_script, "# setup\nalias gs git status\n").unwrap();

        let mut sh = Interpreter::load(paths.clone());
        let mut out = Vec::new();
        sh.startup(&PluginLoader::new(NativeOpener), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Type 'help' for assistance"));
        assert!(out.contains("> alias gs git status"));
        assert_eq!(sh.context().aliases.get("gs"), Some("git status"));
        assert!(sh.context().plugins.is_empty());

        // The alias was persisted.
        let saved = fs::read_to_string(&paths.aliases).unwrap();
        assert!(saved.contains("git status"));
    }

    #[test]
    fn broken_plugin_is_reported_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ShellPaths::under(dir.path());
        paths.ensure().unwrap();
        fs::write(paths.plugins.join("broken.so"), "not a library").unwrap();

        let mut sh = Interpreter::load(paths);
        let mut out = Vec::new();
        sh.startup(&PluginLoader::new(NativeOpener), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("✖ Failed to load plugin broken: "));
        assert!(sh.context().plugins.is_empty());
    }

    #[test]
    fn plugin_outcomes_are_reported_in_load_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ShellPaths::under(dir.path());
        paths.ensure().unwrap();
        fs::write(paths.plugins.join("a.plugin"), "error").unwrap();
        fs::write(paths.plugins.join("b.plugin"), "weather").unwrap();
        fs::write(paths.plugins.join("c.plugin"), "no-entry").unwrap();

        let mut sh = Interpreter::load(paths);
        let mut out = Vec::new();
        sh.startup(&PluginLoader::new(ScriptedOpener), &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(
            "✖ Failed to load plugin a: syntax error\n\
             ✔ Loaded plugin: b\n\
             ✖ Failed to load plugin c: missing entry point\n"
        ));
    }

    #[test]
    fn end_of_input_exits_even_when_exit_is_aliased() {
        let mut sh = Interpreter::new(ShellContext::in_memory());
        sh.context_mut().aliases.set("exit", "history").unwrap();

        let mut out = Vec::new();
        sh.end_of_input(&mut out).unwrap();

        assert!(sh.context().env.should_exit);
        assert_eq!(String::from_utf8(out).unwrap(), "Farewell from DeviShell.\n");
        assert!(sh.context().history.is_empty());
    }

    #[test]
    fn run_line_records_history() {
        let mut sh = Interpreter::new(ShellContext::in_memory());
        let mut out = Vec::new();
        sh.run_line("history", &mut out).unwrap();
        assert_eq!(sh.context().history.len(), 1);
    }
}

use crate::builtin;
use crate::command::CommandRegistry;
use crate::completer::Completer;
use crate::config::{Config, ShellPaths};
use crate::env::Environment;
use crate::error::Result;
use crate::extended;
use crate::external::ExternalInterpreter;
use crate::history::HistoryRecord;
use crate::plugin::{LoadEvent, LoadReport, ModuleOpener, PluginLoader, PluginSet};
use crate::prompt::PromptStateCache;
use crate::store::{AliasStore, BookmarkStore};

/// Everything a running shell owns.
///
/// Constructed once at startup and handed by `&mut` to the router and to every
/// command handler.
#[derive(Debug)]
pub struct ShellContext {
    pub env: Environment,
    pub config: Config,
    /// `None` when nothing is persisted.
    pub paths: Option<ShellPaths>,
    pub aliases: AliasStore,
    pub bookmarks: BookmarkStore,
    pub registry: CommandRegistry,
    pub plugins: PluginSet,
    pub history: HistoryRecord,
    pub prompt: PromptStateCache,
}

/// Registry with every builtin and extended command.
pub fn standard_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    builtin::register(&mut registry);
    extended::register(&mut registry);
    registry
}

impl ShellContext {
    /// A context that keeps all state in memory, with default config.
    pub fn in_memory() -> Self {
        Self {
            env: Environment::new(),
            config: Config::default(),
            paths: None,
            aliases: AliasStore::default(),
            bookmarks: BookmarkStore::default(),
            registry: standard_registry(),
            plugins: PluginSet::default(),
            history: HistoryRecord::default(),
            prompt: PromptStateCache::default(),
        }
    }

    /// Create the state directory and read config, aliases and bookmarks from it.
    ///
    /// Nothing here is fatal: a directory that cannot be created and unreadable
    /// files are logged, and the stores start empty.
    pub fn load(paths: ShellPaths) -> Self {
        if let Err(e) = paths.ensure() {
            log::warn!("{e}; continuing without a usable state directory");
        }
        Self {
            config: Config::load_or_default(&paths.config),
            aliases: AliasStore::open(&paths.aliases),
            bookmarks: BookmarkStore::open(&paths.bookmarks),
            paths: Some(paths),
            ..Self::in_memory()
        }
    }

    /// Scan the plugin directory and admit whatever loads.
    ///
    /// Replaces any previously loaded set; only called once at startup.
    pub fn load_plugins<O: ModuleOpener>(&mut self, loader: &PluginLoader<O>) -> Vec<LoadEvent> {
        let Some(paths) = &self.paths else {
            return Vec::new();
        };
        let LoadReport { plugins, events } = loader.load_all(&paths.plugins);
        self.plugins = plugins;
        events
    }

    /// Persist the config, a no-op for in-memory contexts.
    pub fn save_config(&self) -> Result<()> {
        match &self.paths {
            Some(paths) => self.config.save(&paths.config),
            None => Ok(()),
        }
    }

    pub fn interpreter(&self) -> ExternalInterpreter {
        ExternalInterpreter::new(&self.config.interpreter_path)
    }

    /// Snapshot of the names the completer offers.
    pub fn completer(&self) -> Completer {
        Completer::new(
            self.registry.names(),
            self.aliases.names().map(str::to_string).collect(),
            self.bookmarks.names().map(str::to_string).collect(),
        )
    }
}

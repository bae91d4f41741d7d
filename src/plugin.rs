//! Discovery and loading of plugin modules.
//!
//! A plugin is a shared library exporting a C ABI:
//!
//! ```c
//! int32_t devishell_plugin_init(void);                                 /* required, 0 = ok */
//! bool devishell_handle_command(size_t argc, const char *const *argv); /* optional */
//! ```
//!
//! `devishell_handle_command` receives the full token list of a line no command
//! claimed; returning `true` stops the search. Every module is loaded in
//! isolation: a failure, including a panic raised while initialising it, drops
//! that module only.

use crate::error::{Result, ShellError};
use indexmap::IndexMap;
use libloading::Library;
use std::ffi::{CString, OsStr, c_char};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

const INIT_SYMBOL: &[u8] = b"devishell_plugin_init\0";
const HANDLE_SYMBOL: &[u8] = b"devishell_handle_command\0";

type InitFn = unsafe extern "C" fn() -> i32;
type HandleFn = unsafe extern "C" fn(argc: usize, argv: *const *const c_char) -> bool;

/// A loaded unit of plugin code.
pub trait PluginModule {
    /// Run the registration entry point. `Ok(false)` when the module has none.
    fn register(&self) -> Result<bool>;

    /// Whether the module exports a command interception capability.
    fn handles_commands(&self) -> bool;

    /// Offer a line to the module. `Ok(true)` means it was handled.
    fn handle_command(&self, tokens: &[String]) -> Result<bool>;
}

/// Turns files of a plugin directory into modules.
pub trait ModuleOpener {
    /// Whether `path` looks like a module this opener understands.
    fn accepts(&self, path: &Path) -> bool;

    fn open(&self, name: &str, path: &Path) -> Result<Box<dyn PluginModule>>;
}

/// Opens shared libraries with [`libloading`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeOpener;

impl ModuleOpener for NativeOpener {
    fn accepts(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(OsStr::to_str),
            Some("so" | "dylib" | "dll")
        )
    }

    fn open(&self, name: &str, path: &Path) -> Result<Box<dyn PluginModule>> {
        let library = unsafe { Library::new(path) }
            .map_err(|e| ShellError::plugin(name, format!("failed to load library: {e}")))?;

        let init = unsafe { library.get::<InitFn>(INIT_SYMBOL) }
            .ok()
            .map(|symbol| *symbol);
        let handle = unsafe { library.get::<HandleFn>(HANDLE_SYMBOL) }
            .ok()
            .map(|symbol| *symbol);

        Ok(Box::new(NativeModule {
            name: name.to_string(),
            init,
            handle,
            _library: library,
        }))
    }
}

/// Function pointers resolved from a library, kept valid by owning it.
struct NativeModule {
    name: String,
    init: Option<InitFn>,
    handle: Option<HandleFn>,
    _library: Library,
}

impl PluginModule for NativeModule {
    fn register(&self) -> Result<bool> {
        let Some(init) = self.init else {
            return Ok(false);
        };
        match unsafe { init() } {
            0 => Ok(true),
            status => Err(ShellError::plugin(
                &self.name,
                format!("initialisation failed with status {status}"),
            )),
        }
    }

    fn handles_commands(&self) -> bool {
        self.handle.is_some()
    }

    fn handle_command(&self, tokens: &[String]) -> Result<bool> {
        let Some(handle) = self.handle else {
            return Ok(false);
        };
        let args = tokens
            .iter()
            .map(|t| CString::new(t.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ShellError::plugin(&self.name, format!("invalid argument: {e}")))?;
        let argv: Vec<*const c_char> = args.iter().map(|a| a.as_ptr()).collect();
        Ok(unsafe { handle(argv.len(), argv.as_ptr()) })
    }
}

/// A plugin admitted into the dispatch chain.
pub struct PluginDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub module: Box<dyn PluginModule>,
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Loaded plugins in load order. Fixed for the life of the process.
#[derive(Debug, Default)]
pub struct PluginSet {
    plugins: IndexMap<String, PluginDescriptor>,
}

impl PluginSet {
    pub fn iter(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.plugins.values()
    }

    pub fn get(&self, name: &str) -> Option<&PluginDescriptor> {
        self.plugins.get(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl FromIterator<PluginDescriptor> for PluginSet {
    fn from_iter<I: IntoIterator<Item = PluginDescriptor>>(iter: I) -> Self {
        Self {
            plugins: iter.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }
}

/// What happened to one module during a scan.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded(String),
    Failed(ShellError),
}

/// Result of scanning a plugin directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub plugins: PluginSet,
    /// One entry per accepted file, in load order.
    pub events: Vec<LoadEvent>,
}

impl LoadReport {
    pub fn failures(&self) -> impl Iterator<Item = &ShellError> {
        self.events.iter().filter_map(|event| match event {
            LoadEvent::Failed(e) => Some(e),
            LoadEvent::Loaded(_) => None,
        })
    }
}

/// Scans a directory (non-recursively) and loads every module it accepts.
#[derive(Debug, Default)]
pub struct PluginLoader<O = NativeOpener> {
    opener: O,
}

impl<O: ModuleOpener> PluginLoader<O> {
    pub fn new(opener: O) -> Self {
        Self { opener }
    }

    /// Load every module in `dir`, in file name order.
    ///
    /// A missing directory yields an empty report. A module whose name was
    /// already taken by an earlier file is rejected without being opened.
    pub fn load_all(&self, dir: &Path) -> LoadReport {
        let mut report = LoadReport::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if dir.exists() {
                    log::warn!("cannot scan plugin directory {}: {e}", dir.display());
                }
                return report;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.opener.accepts(path))
            .collect();
        paths.sort();

        for path in paths {
            let name = plugin_name(&path);
            let loaded = match report.plugins.get(&name) {
                Some(existing) => Err(ShellError::plugin(
                    &name,
                    format!("name already loaded from {}", existing.path.display()),
                )),
                None => self.load_isolated(&name, &path),
            };
            match loaded {
                Ok(module) => {
                    log::info!("loaded plugin {name} from {}", path.display());
                    report.events.push(LoadEvent::Loaded(name.clone()));
                    report.plugins.plugins.insert(
                        name.clone(),
                        PluginDescriptor { name, path, module },
                    );
                }
                Err(e) => {
                    log::debug!("skipping {}: {e}", path.display());
                    report.events.push(LoadEvent::Failed(e));
                }
            }
        }
        report
    }

    fn load_isolated(&self, name: &str, path: &Path) -> Result<Box<dyn PluginModule>> {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_> {
            let module = self.opener.open(name, path)?;
            if !module.register()? {
                return Err(ShellError::plugin(name, "missing entry point"));
            }
            Ok(module)
        }));
        attempt.unwrap_or_else(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ShellError::plugin(name, format!("panicked during load: {reason}")))
        })
    }
}

fn plugin_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use devishell::Interpreter;
use devishell::config::ShellPaths;
use devishell::plugin::{NativeOpener, PluginLoader};
use env_logger::Env;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    // SIGINT only stops the foreground child; the shell keeps running.
    ctrlc::set_handler(|| {})?;

    let mut sh = Interpreter::load(ShellPaths::user_default());
    sh.startup(&PluginLoader::new(NativeOpener), &mut std::io::stdout())?;
    sh.repl()
}

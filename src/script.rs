use crate::context::ShellContext;
use crate::report;
use crate::router;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Lines worth dispatching: not blank and not `#` comments.
fn command_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Feed every command line of the script at `path` through the router, in order.
///
/// A missing file is not an error. A line that fails is reported by the router
/// and the next line runs anyway; only `exit` stops the script early.
/// Returns the number of lines dispatched.
pub fn run_startup_script(
    ctx: &mut ShellContext,
    path: &Path,
    out: &mut dyn Write,
) -> io::Result<usize> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            report::error(out, format!("Error reading startup script: {e}"))?;
            return Ok(0);
        }
    };

    report::info(out, "Executing startup script...")?;
    let mut dispatched = 0;
    for line in command_lines(&text) {
        writeln!(out, "> {line}")?;
        router::dispatch_line(ctx, line, out)?;
        dispatched += 1;
        if ctx.env.should_exit {
            break;
        }
    }
    Ok(dispatched)
}

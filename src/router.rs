//! Resolution of one input line to exactly one handler.
//!
//! The chain is fixed: alias substitution, builtin, extended, plugins in load
//! order, then the external interpreter. The first match runs and nothing after
//! it does.

use crate::command::{ExitCode, Tier};
use crate::context::ShellContext;
use crate::external::ExternalOutcome;
use crate::report;
use std::io::{self, Write};

/// What a call to [`resolve`] ended up running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The line had no tokens.
    Empty,
    Builtin { name: String, code: ExitCode },
    Extended { name: String, code: ExitCode },
    Plugin { name: String },
    External(ExternalOutcome),
    /// The interpreter could not be started; the reason has been reported.
    ExternalFailed,
}

/// Split a line on whitespace. No quoting.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Substitute an alias for the first token, once.
///
/// The result is never looked up again, so an alias whose expansion starts
/// with another alias name resolves to that name literally.
pub fn expand_alias(ctx: &ShellContext, tokens: &[String]) -> Option<Vec<String>> {
    let (first, rest) = tokens.split_first()?;
    let expansion = ctx.aliases.expansion_for(first)?;
    let mut expanded = tokenize(expansion);
    if expanded.is_empty() {
        return None;
    }
    expanded.extend(rest.iter().cloned());
    Some(expanded)
}

/// Tokenize `line` and [`resolve`] it.
pub fn dispatch_line(
    ctx: &mut ShellContext,
    line: &str,
    out: &mut dyn Write,
) -> io::Result<DispatchOutcome> {
    resolve(ctx, &tokenize(line), out)
}

/// Run `tokens` through the dispatch chain.
///
/// Handler failures are reported to `out` and never escape; the only error
/// returned is a failure to write to `out` itself.
pub fn resolve(
    ctx: &mut ShellContext,
    tokens: &[String],
    out: &mut dyn Write,
) -> io::Result<DispatchOutcome> {
    if tokens.is_empty() {
        return Ok(DispatchOutcome::Empty);
    }
    ctx.history.push(tokens.join(" "));

    let expanded = expand_alias(ctx, tokens);
    if let Some(expanded) = &expanded {
        report::info(out, format!("Expanding alias: {}", expanded.join(" ")))?;
    }
    let tokens = expanded.as_deref().unwrap_or(tokens);
    let (name, args) = match tokens.split_first() {
        Some(split) => split,
        None => return Ok(DispatchOutcome::Empty),
    };

    if let Some(descriptor) = ctx.registry.lookup(name) {
        let handler = descriptor.handler.clone();
        let (tier, name) = (descriptor.tier, descriptor.name.clone());
        log::debug!("dispatch {tier:?} command {name}");
        let code = match handler(ctx, args, out) {
            Ok(code) => code,
            Err(e) => {
                report::error(out, format!("{e:#}"))?;
                1
            }
        };
        return Ok(match tier {
            Tier::Builtin => DispatchOutcome::Builtin { name, code },
            Tier::Extended => DispatchOutcome::Extended { name, code },
        });
    }

    for plugin in ctx.plugins.iter().filter(|p| p.module.handles_commands()) {
        match plugin.module.handle_command(tokens) {
            Ok(true) => {
                log::debug!("plugin {} handled {name}", plugin.name);
                return Ok(DispatchOutcome::Plugin {
                    name: plugin.name.clone(),
                });
            }
            Ok(false) => {}
            Err(e) => report::error(out, e)?,
        }
    }

    out.flush()?;
    let command_line = tokens.join(" ");
    match ctx.interpreter().run(&command_line, &ctx.env) {
        Ok(ExternalOutcome::Interrupted) => {
            report::warning(out, "Command interrupted")?;
            Ok(DispatchOutcome::External(ExternalOutcome::Interrupted))
        }
        Ok(outcome) => Ok(DispatchOutcome::External(outcome)),
        Err(e) => {
            report::error(out, format!("Configuration error: {e}"))?;
            Ok(DispatchOutcome::ExternalFailed)
        }
    }
}

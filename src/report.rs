//! One-line status messages printed by commands and by the shell itself.

use std::fmt::Display;
use std::io::{self, Write};

pub fn success(out: &mut dyn Write, message: impl Display) -> io::Result<()> {
    writeln!(out, "✔ {message}")
}

pub fn error(out: &mut dyn Write, message: impl Display) -> io::Result<()> {
    writeln!(out, "✖ {message}")
}

pub fn warning(out: &mut dyn Write, message: impl Display) -> io::Result<()> {
    writeln!(out, "⚠ {message}")
}

pub fn info(out: &mut dyn Write, message: impl Display) -> io::Result<()> {
    writeln!(out, "ℹ {message}")
}

/// Print `rows` as two left-aligned columns under a title.
pub fn table<'a>(
    out: &mut dyn Write,
    title: &str,
    headers: (&str, &str),
    rows: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> io::Result<()> {
    let rows: Vec<_> = rows.into_iter().collect();
    let width = rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .chain(std::iter::once(headers.0.chars().count()))
        .max()
        .unwrap_or(0);

    writeln!(out, "{title}")?;
    writeln!(out, "{:<width$}  {}", headers.0, headers.1)?;
    for (key, value) in rows {
        writeln!(out, "{key:<width$}  {value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_first_column() {
        let mut out = Vec::new();
        table(&mut out, "Aliases", ("Alias", "Command"), [("ll", "ls -la"), ("gitlog", "git log")])
            .unwrap();

        let s = String::from_utf8(out).unwrap();
        assert_eq!(
            s,
            "Aliases\nAlias   Command\nll      ls -la\ngitlog  git log\n"
        );
    }

    #[test]
    fn status_prefixes() {
        let mut out = Vec::new();
        success(&mut out, "done").unwrap();
        error(&mut out, "failed").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "✔ done\n✖ failed\n");
    }
}

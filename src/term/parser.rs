use anyhow::{Result, bail};

/// A raw command line and its tokenized form. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub raw: String,
    pub argv: Vec<String>,
}

/// Splits a command line on whitespace. Quoting and escaping are not
/// supported: a token containing a literal space cannot be represented.
pub fn parse_command_line(line: &str) -> Result<ParsedCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("empty command");
    }
    Ok(ParsedCommand {
        raw: trimmed.to_string(),
        argv: trimmed.split_whitespace().map(str::to_string).collect(),
    })
}

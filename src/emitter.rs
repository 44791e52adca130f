//! Writing commands to the output stream.
//!
//! Every call writes exactly one terminated line and flushes, so commands
//! stay ordered with the plain log lines around them.

use crate::command::{Command, CommandProperties};
use crate::error::Result;
use std::io::Write;

/// Line separator of the host platform.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Issue a command with optional properties.
pub fn issue_command<W: Write + ?Sized>(
    out: &mut W,
    command: &str,
    properties: Option<CommandProperties>,
    message: &str,
) -> Result<()> {
    let cmd = Command::new(command, properties, message)?;

    tracing::trace!(
        command = %cmd.name(),
        properties = cmd.properties().map_or(0, |p| p.len()),
        "Issuing command"
    );

    write_line(out, &cmd.encode())
}

/// Issue a command that carries only a payload.
pub fn issue<W: Write + ?Sized>(out: &mut W, command: &str, message: &str) -> Result<()> {
    issue_command(out, command, None, message)
}

/// Write a plain line, bypassing the command envelope.
pub fn issue_plain<W: Write + ?Sized>(out: &mut W, line: &str) -> Result<()> {
    write_line(out, line)
}

fn write_line<W: Write + ?Sized>(out: &mut W, line: &str) -> Result<()> {
    out.write_all(line.as_bytes())?;
    out.write_all(LINE_ENDING.as_bytes())?;
    out.flush()?;
    Ok(())
}

//! Local console relay
//!
//! Engine output is forwarded to the process's own streams as it arrives.

use std::io::{self, IsTerminal, Write};

use crate::infrastructure::{ExecOutput, PullProgress};

/// Returns true if stdout is an interactive terminal
#[must_use]
pub fn stdout_is_terminal() -> bool {
    io::stdout().is_terminal()
}

/// Prints one pull progress message to stdout
pub fn print_pull_progress(progress: &PullProgress) {
    println!("{progress}");
}

/// Forwards a chunk to the local stdout or stderr and flushes it.
///
/// # Errors
///
/// Returns the underlying I/O error if the local stream is closed.
pub fn relay(chunk: &ExecOutput) -> io::Result<()> {
    relay_to(&mut io::stdout().lock(), &mut io::stderr().lock(), chunk)
}

/// Forwards a chunk to `out` or `err`. Combined TTY output goes to `out`.
///
/// # Errors
///
/// Returns the error of the failing writer.
pub fn relay_to(out: &mut impl Write, err: &mut impl Write, chunk: &ExecOutput) -> io::Result<()> {
    match chunk {
        ExecOutput::Stdout(bytes) | ExecOutput::Console(bytes) => {
            out.write_all(bytes)?;
            out.flush()
        }
        ExecOutput::Stderr(bytes) => {
            err.write_all(bytes)?;
            err.flush()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relay_demultiplexes() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let chunks = [
            ExecOutput::Stdout(b"compiling\n".to_vec()),
            ExecOutput::Stderr(b"warning: unused\n".to_vec()),
            ExecOutput::Stdout(b"done\n".to_vec()),
        ];
        for chunk in &chunks {
            relay_to(&mut out, &mut err, chunk).unwrap();
        }
        assert_eq!(String::from_utf8(out).unwrap(), "compiling\ndone\n");
        assert_eq!(String::from_utf8(err).unwrap(), "warning: unused\n");
    }

    #[test]
    fn test_relay_console_goes_to_stdout() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        relay_to(&mut out, &mut err, &ExecOutput::Console(b"\x1b[32mok\x1b[0m".to_vec())).unwrap();
        assert_eq!(out, b"\x1b[32mok\x1b[0m".to_vec());
        assert!(err.is_empty());
    }
}

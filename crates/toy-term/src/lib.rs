// SPDX-License-Identifier: MIT
//
// toy-term — terminal control and raw input for terminal-toys.
//
// The one subsystem every toy shares: detect what kind of terminal we
// are on, take (and always give back) raw keyboard control, decode
// the byte stream into a handful of key events without blocking the
// animation loop, and repaint whole frames in whatever discipline the
// terminal can actually handle.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. The suite's needs are small and exact —
// three terminal classes, five key events, one redraw contract — and
// owning every byte we emit is what makes the degraded-terminal path
// dependable.
//
// Games interact through [`Session`]; the individual layers are
// public for anyone who wants them à la carte.

pub mod ansi;
pub mod env;
pub mod input;
pub mod poll;
pub mod screen;
pub mod session;
pub mod terminal;

pub use env::{TerminalClass, detect};
pub use input::{Arrow, Key, Parser};
pub use poll::Poller;
pub use screen::Screen;
pub use session::Session;
pub use terminal::{RawMode, Size, size};

use std::io;

/// Errors that cross the core/game boundary.
///
/// Deliberately small: detection failures, malformed escape
/// sequences, and raw-mode unavailability all resolve locally to a
/// safe default and never surface here. What remains is the one
/// programming error (double acquisition) and the one fatal class
/// (the output stream going away).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A second raw-mode handle was requested while one is live.
    #[error("raw mode is already held by this process")]
    AlreadyAcquired,

    /// Raw mode could not be entered (no interactive terminal).
    /// Callers degrade to the line-buffered decoder; [`Session`]
    /// does this automatically.
    #[error("raw mode unavailable: {0}")]
    RawModeUnavailable(#[source] io::Error),

    /// The render target or input stream failed outright.
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn errors_display_something_useful() {
        assert!(Error::AlreadyAcquired.to_string().contains("already"));

        let unavailable = Error::RawModeUnavailable(io::Error::new(
            io::ErrorKind::NotConnected,
            "stdin is not a terminal",
        ));
        assert!(unavailable.to_string().contains("unavailable"));
    }
}

// SPDX-License-Identifier: MIT
//
// The toys. Each module is a pure-state game struct (unit-testable,
// no terminal involved) plus a `run()` entry point that owns one
// [`toy_term::Session`] for its lifetime. Frames are built as whole
// `Vec<String>`s and handed to `Session::draw`; no game touches
// termios or escape sequences directly.

pub mod bounce;
pub mod game2048;
pub mod life;
pub mod paint;
pub mod snake;
pub mod tetris;
pub mod tictactoe;

use toy_term::TerminalClass;

/// Whether a toy should stick to plain ASCII glyphs.
///
/// Degraded terminals (WSL consoles in particular) render box-drawing
/// and geometric glyphs inconsistently, so the toys fall back to their
/// ASCII charsets there.
pub(crate) fn ascii_only(class: TerminalClass) -> bool {
    class == TerminalClass::PosixTtyDegraded
}

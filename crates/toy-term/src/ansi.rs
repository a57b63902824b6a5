// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Every sequence the suite emits lives here — screen control as small
// writer functions, SGR styling as string constants the games embed
// directly in their frame lines. The set is deliberately tiny: this
// suite enables no mouse protocol, no bracketed paste, no keyboard
// protocol extensions, so none of their sequences exist here either.

use std::io::{self, Write};

use unicode_width::UnicodeWidthChar;

// ─── Cursor control ─────────────────────────────────────────────────────────

/// Move the cursor to the top-left origin: `ESC [ H`
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Hide the cursor: `ESC [ ? 25 l`
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor: `ESC [ ? 25 h`
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen control ─────────────────────────────────────────────────────────

/// Clear the visible screen and home the cursor: `ESC [ 2 J ESC [ H`
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J\x1b[H")
}

/// Clear the screen *and* the scrollback buffer, then home the
/// cursor: `ESC [ 2 J ESC [ 3 J ESC [ H`
///
/// The degraded renderer uses this before every frame — on terminals
/// where cursor addressing is unreliable, stale frames otherwise pile
/// up in scrollback.
pub fn clear_all(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J\x1b[3J\x1b[H")
}

/// Erase from the cursor to the end of the line: `ESC [ K`
pub fn clear_line_tail(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[K")
}

/// Switch to the alternate screen buffer: `ESC [ ? 1049 h`
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Switch back to the main screen buffer: `ESC [ ? 1049 l`
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Reset all SGR attributes: `ESC [ 0 m`
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── SGR style markers ──────────────────────────────────────────────────────
//
// Bright foreground colors, embedded by games directly in frame line
// strings. Always pair with RESET.

pub const RED: &str = "\x1b[91m";
pub const GREEN: &str = "\x1b[92m";
pub const YELLOW: &str = "\x1b[93m";
pub const BLUE: &str = "\x1b[94m";
pub const MAGENTA: &str = "\x1b[95m";
pub const CYAN: &str = "\x1b[96m";
pub const WHITE: &str = "\x1b[97m";
pub const GRAY: &str = "\x1b[90m";
/// Inverse video — used for cursors drawn on blank cells.
pub const INVERT: &str = "\x1b[7m";
pub const RESET: &str = "\x1b[0m";

// ─── Measurement ────────────────────────────────────────────────────────────

/// Display width of a string, ignoring embedded SGR markers.
///
/// Walks the string once, skipping `ESC [ ... final` sequences and
/// summing Unicode column widths of everything else. Games use this
/// to center styled banners; the plain `str::len` would count escape
/// bytes and double-width glyphs wrongly.
#[must_use]
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            // Skip a CSI sequence through its final byte (@..~).
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            continue;
        }
        width += ch.width().unwrap_or(0);
    }

    width
}

// ─── Tests ──────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Frame rendering.
//
// The renderer owns the output side of the terminal: alternate
// screen, cursor visibility, and the full-frame redraw discipline.
// Frames are whole — an ordered list of line strings, redrawn in
// full every time. No cell diffing: boards are small (bounded by the
// geometry clamp), and whole-frame writes are what the degraded
// class needs anyway.
//
// Two redraw disciplines, chosen by terminal class:
//
//   cursor-addressed — home the cursor and overwrite in place, with
//     an erase-to-end-of-line after each line so shrinking content
//     leaves no residue. Flicker-free; used wherever cursor
//     addressing is trustworthy.
//
//   clear-and-repaint — wipe the screen and scrollback, then emit
//     the frame. The only discipline that renders correctly on the
//     degraded class, where in-place overwrites have been observed
//     to smear.
//
// Either way, a frame is accumulated into one buffer and written
// with a single syscall, so the terminal never sees a torn frame.
//
// The mirror of raw mode's invariant lives here: alternate screen
// off and cursor visible before the process exits, on every path.
// `leave()` is idempotent and runs on drop; the panic hook in
// `terminal.rs` covers the paths drop cannot reach.

use std::io::{self, Write};

use crate::ansi;
use crate::env::TerminalClass;

/// Frame renderer with RAII cleanup.
///
/// [`enter`](Self::enter) switches to full-screen mode,
/// [`draw`](Self::draw) repaints, [`leave`](Self::leave) restores the
/// terminal. Both `enter` and `leave` are idempotent; `leave` also
/// runs on drop.
pub struct Screen {
    class: TerminalClass,
    /// Whether a full `enter` has run. Distinct from the two output
    /// flags below: hiding the cursor alone must not make a later
    /// `enter` skip the screen switch.
    entered: bool,
    /// Whether we switched to the alternate screen.
    alt_active: bool,
    /// Whether we hid the cursor.
    cursor_hidden: bool,
}

impl Screen {
    /// Create a renderer for the given terminal class. Emits nothing
    /// until [`enter`](Self::enter).
    #[must_use]
    pub const fn new(class: TerminalClass) -> Self {
        Self {
            class,
            entered: false,
            alt_active: false,
            cursor_hidden: false,
        }
    }

    /// Whether full-screen mode is currently active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.entered || self.alt_active || self.cursor_hidden
    }

    /// Enter full-screen mode: alternate screen (where the class
    /// supports it), cursor hidden, screen cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream is unavailable — the one
    /// fatal error class.
    pub fn enter(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.enter_to(&mut lock)
    }

    /// [`enter`](Self::enter) against an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn enter_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if self.entered {
            return Ok(());
        }
        self.entered = true;

        if self.class.uses_alt_screen() {
            ansi::enter_alt_screen(w)?;
            self.alt_active = true;
        }
        ansi::cursor_hide(w)?;
        self.cursor_hidden = true;
        ansi::clear_screen(w)?;
        w.flush()
    }

    /// Draw one whole frame.
    ///
    /// The frame is consumed as a snapshot: lines are emitted in
    /// order, top to bottom, in a single buffered write.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream is unavailable.
    pub fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.draw_to(&mut lock, lines)
    }

    /// [`draw`](Self::draw) against an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn draw_to(&mut self, w: &mut impl Write, lines: &[String]) -> io::Result<()> {
        let frame = self.render_frame(lines);
        w.write_all(&frame)?;
        w.flush()
    }

    /// Build the byte stream for one frame.
    fn render_frame(&self, lines: &[String]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4096);

        if self.class.cursor_addressable() {
            buf.extend_from_slice(b"\x1b[H");
            for line in lines {
                buf.extend_from_slice(line.as_bytes());
                // Erase any residue from a longer previous line.
                buf.extend_from_slice(b"\x1b[K\r\n");
            }
        } else {
            // Degraded: full clear (scrollback included), then the
            // frame as one atomic blob.
            buf.extend_from_slice(b"\x1b[2J\x1b[3J\x1b[H");
            for line in lines {
                buf.extend_from_slice(line.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
        }

        buf
    }

    /// Leave full-screen mode: styling reset, cursor shown, original
    /// screen buffer restored. Safe to call any number of times.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails; internal state is cleared
    /// regardless, so a retry won't double-emit.
    pub fn leave(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.leave_to(&mut lock)
    }

    /// [`leave`](Self::leave) against an arbitrary writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn leave_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.is_active() {
            return Ok(());
        }

        let had_alt = self.alt_active;
        self.entered = false;
        self.alt_active = false;
        self.cursor_hidden = false;

        ansi::reset(w)?;
        ansi::cursor_show(w)?;
        if had_alt {
            // Last, so the restored shell content appears clean.
            ansi::exit_alt_screen(w)?;
        } else {
            // No alternate screen to restore from — leave the main
            // screen tidy instead of on top of the last frame.
            ansi::clear_screen(w)?;
        }
        w.flush()
    }

    /// Hide the terminal cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::cursor_hide(&mut lock)?;
        self.cursor_hidden = true;
        lock.flush()
    }

    /// Show the terminal cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::cursor_show(&mut lock)?;
        self.cursor_hidden = false;
        lock.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.leave();
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

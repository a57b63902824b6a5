// SPDX-License-Identifier: MIT
//
// Session — the one context object a game needs.
//
// The whole startup sequence in one constructor: detect the terminal
// class, measure it, take raw mode (or degrade to the line-buffered
// decoder if no interactive terminal is attached), and switch to
// full-screen rendering. Teardown is the constructor in reverse and
// runs on drop, so a game that panics or returns early still hands
// the user back a working shell.
//
// Games hold exactly one `Session` and thread it through their loop;
// nothing in this crate stashes per-game state in globals. The only
// process-wide pieces are the raw-mode guard and the panic-recovery
// backup, which exist precisely because a panic hook cannot reach a
// local.

use std::time::Duration;

use crate::Error;
use crate::env::{self, TerminalClass};
use crate::input::Key;
use crate::poll::Poller;
use crate::screen::Screen;
use crate::terminal::{self, RawMode, Size};

/// A live full-screen terminal session.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use toy_term::{Key, Session};
///
/// let mut session = Session::new()?;
/// loop {
///     match session.poll_key(Duration::from_millis(50))? {
///         Some(Key::Char('q') | Key::Interrupt) => break,
///         Some(_) | None => {}
///     }
///     session.draw(&["hello".to_string()])?;
/// }
/// // Dropping the session restores the terminal.
/// # Ok::<(), toy_term::Error>(())
/// ```
pub struct Session {
    class: TerminalClass,
    size: Size,
    /// Held for the session lifetime; `None` when the line-buffered
    /// fallback is in use.
    raw: Option<RawMode>,
    poller: Poller,
    screen: Screen,
}

impl Session {
    /// Start a session: detect, measure, acquire input, enter the
    /// screen.
    ///
    /// If raw mode is unavailable (stdin is not an interactive
    /// terminal), the session still starts — input degrades to
    /// line-buffered polling and everything else works.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyAcquired`] if another session is live in this
    /// process; [`Error::Io`] if the output stream is unavailable.
    pub fn new() -> Result<Self, Error> {
        let class = env::detect();
        let size = terminal::size();

        let (raw, poller) = match RawMode::acquire(class) {
            Ok(handle) => (Some(handle), Poller::raw(class)),
            Err(Error::RawModeUnavailable(_)) => (None, Poller::lines()),
            Err(e) => return Err(e),
        };

        let mut screen = Screen::new(class);
        screen.enter()?;

        Ok(Self {
            class,
            size,
            raw,
            poller,
            screen,
        })
    }

    /// The detected terminal class.
    #[inline]
    #[must_use]
    pub const fn class(&self) -> TerminalClass {
        self.class
    }

    /// Terminal size measured at session start.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Whether input is on the degraded line-buffered path.
    #[must_use]
    pub const fn is_fallback_input(&self) -> bool {
        self.poller.is_fallback()
    }

    /// Wait up to `timeout` for the next key.
    ///
    /// Returns `Ok(None)` when nothing arrives in time. A
    /// [`Key::Interrupt`] means the user asked to cancel — unwind to
    /// cleanup, don't keep playing.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails outright.
    pub fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>, Error> {
        Ok(self.poller.poll(timeout)?)
    }

    /// Draw one whole frame, top line first.
    ///
    /// # Errors
    ///
    /// Returns an error if the output stream is unavailable.
    pub fn draw(&mut self, lines: &[String]) -> Result<(), Error> {
        self.screen.draw(lines)?;
        Ok(())
    }

    /// Hide the terminal cursor (already hidden after `new`).
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn hide_cursor(&mut self) -> Result<(), Error> {
        self.screen.hide_cursor()?;
        Ok(())
    }

    /// Show the terminal cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn show_cursor(&mut self) -> Result<(), Error> {
        self.screen.show_cursor()?;
        Ok(())
    }

    /// Tear the session down explicitly: leave the screen, release
    /// raw mode. Idempotent; also runs on drop.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; cleanup of the remaining
    /// resources still proceeds.
    pub fn close(&mut self) -> Result<(), Error> {
        let screen_result = self.screen.leave();
        let raw_result = match self.raw.as_mut() {
            Some(handle) => handle.release(),
            None => Ok(()),
        };
        screen_result?;
        raw_result?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // Session::new touches the real terminal, so unit tests here are
    // limited to what holds in any environment. The lifecycle pieces
    // are covered per-component in terminal.rs and screen.rs.

    #[test]
    fn session_starts_in_any_environment() {
        let _lock = crate::terminal::GUARD_TEST_LOCK.lock().unwrap();
        // In tests stdin is typically not a tty: raw mode degrades to
        // the fallback poller, and the session must still come up.
        match Session::new() {
            Ok(mut session) => {
                assert!(session.size().cols >= 40);
                session.close().unwrap();
                session.close().unwrap(); // Idempotent.
            }
            Err(e) => panic!("session must not fail to start: {e}"),
        }
    }
}

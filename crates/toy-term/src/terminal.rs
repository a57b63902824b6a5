// SPDX-License-Identifier: MIT
//
// Terminal geometry and raw-mode control.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// The single most safety-critical invariant in the suite lives here:
// every acquired raw-mode handle is released exactly once before the
// process exits, on every path — normal quit, error, panic, Ctrl+C.
// A terminal left in raw mode has no echo and no line editing; the
// user's shell is unusable until they blind-type `reset`.
//
// Three layers enforce the invariant:
//
//   1. `RawMode` is an RAII handle — release runs on drop.
//   2. `release()` is idempotent, so explicit release plus drop is fine.
//   3. A panic hook writes a pre-built restore sequence directly to
//      fd 1 (bypassing Rust's stdout lock, which the panicking thread
//      may hold mid-frame) and restores termios from a global backup.

use std::fmt;
use std::io;
use std::sync::Mutex;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Error;
use crate::env::TerminalClass;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

/// Fixed default when the terminal size cannot be determined.
pub const FALLBACK_SIZE: Size = Size { cols: 80, rows: 24 };

/// Smallest size we will report. Games lay out fixed UI chrome and
/// need some minimum room to be playable.
pub const MIN_SIZE: Size = Size { cols: 40, rows: 20 };

/// Largest size we will report. A frame is redrawn whole every tick;
/// capping the area keeps that cheap even on huge terminals.
pub const MAX_SIZE: Size = Size { cols: 200, rows: 60 };

/// Current terminal size, clamped to the safe band.
///
/// Attempts `ioctl(TIOCGWINSZ)`; implausible answers (zero either way)
/// fall back to [`FALLBACK_SIZE`], everything else is clamped to
/// [`MIN_SIZE`]..=[`MAX_SIZE`]. Never fails. Re-poll at will — there
/// are no resize notifications.
#[must_use]
pub fn size() -> Size {
    query_size().map_or(FALLBACK_SIZE, sanitize)
}

/// Clamp a raw size query result to the safe band.
///
/// Zero in either dimension means the query was nonsense; use the
/// fixed default rather than clamping garbage up to the minimum.
#[must_use]
pub fn sanitize(raw: Size) -> Size {
    if raw.cols == 0 || raw.rows == 0 {
        return FALLBACK_SIZE;
    }
    Size {
        cols: raw.cols.clamp(MIN_SIZE.cols, MAX_SIZE.cols),
        rows: raw.rows.clamp(MIN_SIZE.rows, MAX_SIZE.rows),
    }
}

/// Query the terminal size via `ioctl(TIOCGWINSZ)`, unclamped.
#[cfg(unix)]
fn query_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
fn query_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`RawMode`] handle owns its own copy, but the panic hook can't
/// access it. This backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore the input discipline without the handle.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Complete terminal restore sequence for emergency use.
///
/// Reset SGR attributes, show the cursor, exit the alternate screen —
/// in that order, so the restored shell content appears last with no
/// leftover styling.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h\x1b[?1049l";

/// Panic hook guard — the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing
/// the error.
///
/// Without this, a panic in raw mode leaves the user's terminal
/// broken: no echo, no line editing, no readable error message. The
/// hook writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing
/// Rust's stdout lock to avoid deadlock), restores termios, then
/// delegates to the original panic handler so the message prints to
/// a working terminal.
pub(crate) fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// At most one live [`RawMode`] handle per process.
static RAW_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Serializes tests that touch the process-global guard.
#[cfg(test)]
pub(crate) static GUARD_TEST_LOCK: Mutex<()> = Mutex::new(());

/// RAII handle over the terminal's input discipline.
///
/// While held, keystrokes are delivered byte-by-byte, unechoed.
/// Dropping the handle (or calling [`release`](Self::release)) puts
/// the saved discipline back exactly as it was. Release is
/// idempotent; acquiring a second handle before releasing the first
/// is an error.
///
/// # Example
///
/// ```no_run
/// use toy_term::env;
/// use toy_term::terminal::RawMode;
///
/// let mut raw = RawMode::acquire(env::detect())?;
/// // ... poll keys ...
/// raw.release()?; // or just drop it
/// # Ok::<(), toy_term::Error>(())
/// ```
pub struct RawMode {
    /// Original termios saved before entering raw mode. `None` on
    /// native-console targets (nothing to restore) and after release.
    #[cfg(unix)]
    saved: Option<libc::termios>,

    /// Set once the snapshot has been put back.
    released: bool,
}

impl RawMode {
    /// Acquire raw-mode control of the terminal.
    ///
    /// On [`TerminalClass::NativeConsole`] this is a capability marker
    /// only — the console's per-key read API needs no discipline
    /// change. On the POSIX classes it snapshots termios and switches
    /// to unbuffered, unechoed input. `ISIG` (the kernel turning
    /// Ctrl+C into SIGINT) is disabled for `PosixTty` but kept for
    /// `PosixTtyDegraded`: degraded hosts showed unreliable
    /// cancellation with ISIG off, and the key decoder watches for
    /// the interrupt byte itself either way.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyAcquired`] if another handle is live;
    /// [`Error::RawModeUnavailable`] if stdin is not an interactive
    /// terminal or termios calls fail — callers should fall back to
    /// the line-buffered decoder, not abort.
    pub fn acquire(class: TerminalClass) -> Result<Self, Error> {
        if RAW_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyAcquired);
        }

        install_panic_hook();

        match Self::enter(class) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                RAW_ACTIVE.store(false, Ordering::SeqCst);
                Err(Error::RawModeUnavailable(e))
            }
        }
    }

    #[cfg(unix)]
    fn enter(class: TerminalClass) -> io::Result<Self> {
        if !class.uses_termios() {
            return Ok(Self {
                saved: None,
                released: false,
            });
        }

        if !is_tty() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "stdin is not a terminal",
            ));
        }

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            let saved = termios;

            // Also save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(saved);
            }

            // Byte-at-a-time, no echo, no line editing.
            termios.c_iflag &=
                !(libc::BRKINT | libc::ISTRIP | libc::INLCR | libc::IGNCR | libc::ICRNL
                    | libc::IXON);
            termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::IEXTEN);

            // Full raw mode only where cancellation behaves: degraded
            // hosts keep ISIG and kernel output processing (cbreak-ish).
            if class == TerminalClass::PosixTty {
                termios.c_lflag &= !libc::ISIG;
                termios.c_oflag &= !libc::OPOST;
            }

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte.
            // Readiness is checked with poll() first, so reads never
            // actually stall the loop.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                saved: Some(saved),
                released: false,
            })
        }
    }

    #[cfg(not(unix))]
    fn enter(class: TerminalClass) -> io::Result<Self> {
        if class.uses_termios() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "termios is not available on this platform",
            ));
        }
        Ok(Self { released: false })
    }

    /// Restore the saved input discipline.
    ///
    /// Idempotent: a second call (or a call after a no-op acquire) is
    /// a no-op, never an error. Also runs on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if `tcsetattr` fails. The handle is still
    /// marked released — retrying cannot help.
    pub fn release(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        RAW_ACTIVE.store(false, Ordering::SeqCst);

        #[cfg(unix)]
        if let Some(ref original) = self.saved.take() {
            // Restored (or about to be) — the panic hook no longer
            // needs the backup.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
        }

        Ok(())
    }

    /// Whether the handle has already been released.
    #[inline]
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

// Manual impl: the termios snapshot is opaque noise and libc doesn't
// derive Debug for it anyway.
impl fmt::Debug for RawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMode")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Geometry ──────────────────────────────────────────────────────

    #[test]
    fn sanitize_zero_falls_back_to_default() {
        assert_eq!(sanitize(Size { cols: 0, rows: 0 }), FALLBACK_SIZE);
    }

    #[test]
    fn sanitize_zero_cols_falls_back() {
        assert_eq!(sanitize(Size { cols: 0, rows: 50 }), FALLBACK_SIZE);
    }

    #[test]
    fn sanitize_zero_rows_falls_back() {
        assert_eq!(sanitize(Size { cols: 100, rows: 0 }), FALLBACK_SIZE);
    }

    #[test]
    fn sanitize_passes_plausible_sizes_through() {
        let s = Size { cols: 120, rows: 40 };
        assert_eq!(sanitize(s), s);
    }

    #[test]
    fn sanitize_clamps_tiny_terminals_up() {
        assert_eq!(sanitize(Size { cols: 10, rows: 5 }), MIN_SIZE);
    }

    #[test]
    fn sanitize_clamps_huge_terminals_down() {
        assert_eq!(sanitize(Size { cols: 5000, rows: 2000 }), MAX_SIZE);
    }

    #[test]
    fn sanitize_clamps_each_axis_independently() {
        assert_eq!(
            sanitize(Size { cols: 30, rows: 500 }),
            Size { cols: 40, rows: 60 }
        );
    }

    #[test]
    fn size_never_fails() {
        let s = size();
        assert!(s.cols >= MIN_SIZE.cols);
        assert!(s.rows >= MIN_SIZE.rows);
        assert!(s.cols <= MAX_SIZE.cols);
        assert!(s.rows <= MAX_SIZE.rows);
    }

    #[test]
    fn is_tty_does_not_panic() {
        let _ = is_tty();
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_is_valid_utf8() {
        std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
    }

    #[test]
    fn emergency_restore_exits_alt_screen_last() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.ends_with("\x1b[?1049l"));
    }

    #[test]
    fn emergency_restore_shows_cursor_and_resets_attrs() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.contains("\x1b[?25h"), "must show cursor");
        assert!(s.contains("\x1b[0m"), "must reset SGR attributes");
    }

    // ── RawMode guard ───────────────────────────────────────────────
    //
    // Tests run with a non-tty stdin, so POSIX acquisition reports
    // RawModeUnavailable; NativeConsole-style marker handles exercise
    // the guard and idempotence logic directly. The tests share one
    // process-global guard, hence the serializing mutex.

    fn marker_handle() -> RawMode {
        RawMode {
            #[cfg(unix)]
            saved: None,
            released: false,
        }
    }

    #[test]
    fn posix_acquire_without_tty_degrades_not_panics() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        match RawMode::acquire(TerminalClass::PosixTty) {
            // CI and piped runs: not a terminal.
            Err(Error::RawModeUnavailable(_)) => {}
            // Interactive run: must release cleanly.
            Ok(mut handle) => handle.release().unwrap(),
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert!(!RAW_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn second_acquire_while_held_is_an_error() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        let mut first = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        match RawMode::acquire(TerminalClass::NativeConsole) {
            Err(Error::AlreadyAcquired) => {}
            other => panic!("expected AlreadyAcquired, got {other:?}"),
        }
        first.release().unwrap();
    }

    #[test]
    fn release_clears_the_guard() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        let mut handle = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        handle.release().unwrap();
        // A fresh acquire must now succeed.
        let mut again = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        again.release().unwrap();
    }

    #[test]
    fn debug_output_tracks_release_state() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        let mut handle = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        assert!(format!("{handle:?}").contains("released: false"));
        handle.release().unwrap();
        assert!(format!("{handle:?}").contains("released: true"));
    }

    #[test]
    fn release_is_idempotent() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        let mut handle = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        handle.release().unwrap();
        handle.release().unwrap();
        assert!(handle.is_released());
    }

    #[test]
    fn drop_releases_the_guard() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        {
            let _handle = RawMode::acquire(TerminalClass::NativeConsole).unwrap();
        }
        assert!(!RAW_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn failed_acquire_leaves_guard_clear() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        if RawMode::acquire(TerminalClass::PosixTty).is_err() {
            assert!(!RAW_ACTIVE.load(Ordering::SeqCst));
        }
    }

    #[test]
    fn release_on_marker_handle_is_a_noop() {
        let _lock = GUARD_TEST_LOCK.lock().unwrap();
        let mut handle = marker_handle();
        handle.release().unwrap();
        handle.release().unwrap();
    }
}

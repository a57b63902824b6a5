// SPDX-License-Identifier: MIT
//
// Terminal environment detection.
//
// Every toy starts by asking one question: what kind of terminal are
// we talking to? The answer picks the raw-mode discipline, the key
// decoding details, and the redraw strategy for the whole process.
//
// Three classes cover everything we have seen in the wild:
//
//   NativeConsole    — the Windows console host. Per-key reads come
//                      from the console API, special keys arrive as a
//                      two-byte prefix sequence, no termios involved.
//   PosixTty         — a healthy Unix terminal. Full raw mode, cursor
//                      addressed redraw, alternate screen.
//   PosixTtyDegraded — a compatibility-layer terminal (WSL consoles,
//                      TERM=dumb, or no tty at all) where cursor
//                      addressed redraw and the alternate screen are
//                      unreliable. Everything still works, via full
//                      clear-and-repaint.
//
// Detection is a best-effort signature match with no authoritative
// source of truth, so misclassification is expected and must be safe:
// anything we cannot confirm lands in the degraded class, which
// renders correctly on every terminal we know of.

use std::sync::OnceLock;

/// Capability class of the host terminal.
///
/// Determined once per process by [`detect`]; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalClass {
    /// Windows console host — native per-key read API.
    NativeConsole,
    /// POSIX terminal with reliable cursor addressing.
    PosixTty,
    /// POSIX terminal where cursor-addressed redraw is unreliable;
    /// forces full-buffer repaint and skips the alternate screen.
    PosixTtyDegraded,
}

impl TerminalClass {
    /// Whether cursor-addressed partial redraw is trustworthy here.
    #[inline]
    #[must_use]
    pub const fn cursor_addressable(self) -> bool {
        !matches!(self, Self::PosixTtyDegraded)
    }

    /// Whether the alternate screen buffer should be used.
    ///
    /// Same split as [`cursor_addressable`](Self::cursor_addressable):
    /// the degraded class has been observed to interact badly with
    /// `?1049h`, so it stays on the main screen.
    #[inline]
    #[must_use]
    pub const fn uses_alt_screen(self) -> bool {
        !matches!(self, Self::PosixTtyDegraded)
    }

    /// Whether this class needs termios raw-mode handling at all.
    #[inline]
    #[must_use]
    pub const fn uses_termios(self) -> bool {
        !matches!(self, Self::NativeConsole)
    }
}

/// Detect the host's terminal class.
///
/// Reads environment/OS identification facilities only; never fails.
/// The result is computed once and cached for the process lifetime —
/// repeated calls are free and always agree.
#[must_use]
pub fn detect() -> TerminalClass {
    static CLASS: OnceLock<TerminalClass> = OnceLock::new();
    *CLASS.get_or_init(detect_uncached)
}

#[cfg(windows)]
fn detect_uncached() -> TerminalClass {
    TerminalClass::NativeConsole
}

#[cfg(unix)]
fn detect_uncached() -> TerminalClass {
    classify(
        crate::terminal::is_tty(),
        std::env::var("TERM").ok().as_deref(),
        proc_version().as_deref(),
    )
}

#[cfg(not(any(unix, windows)))]
fn detect_uncached() -> TerminalClass {
    TerminalClass::PosixTtyDegraded
}

/// Contents of `/proc/version`, if readable.
///
/// WSL kernels identify themselves here ("microsoft"); real Linux and
/// the BSDs either lack the file or say something else.
#[cfg(unix)]
fn proc_version() -> Option<String> {
    std::fs::read_to_string("/proc/version").ok()
}

/// Pure classification from observed facts. Split out so tests can
/// exercise every signature without a real terminal.
fn classify(is_tty: bool, term: Option<&str>, proc_version: Option<&str>) -> TerminalClass {
    if !is_tty {
        return TerminalClass::PosixTtyDegraded;
    }

    match term {
        None | Some("") | Some("dumb") => return TerminalClass::PosixTtyDegraded,
        Some(_) => {}
    }

    // WSL signature: the kernel build string names Microsoft.
    if proc_version.is_some_and(|v| v.to_ascii_lowercase().contains("microsoft")) {
        return TerminalClass::PosixTtyDegraded;
    }

    TerminalClass::PosixTty
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn healthy_tty_is_posix() {
        assert_eq!(
            classify(true, Some("xterm-256color"), Some("Linux version 6.1")),
            TerminalClass::PosixTty
        );
    }

    #[test]
    fn no_tty_is_degraded() {
        assert_eq!(
            classify(false, Some("xterm-256color"), None),
            TerminalClass::PosixTtyDegraded
        );
    }

    #[test]
    fn dumb_term_is_degraded() {
        assert_eq!(
            classify(true, Some("dumb"), None),
            TerminalClass::PosixTtyDegraded
        );
    }

    #[test]
    fn missing_term_is_degraded() {
        assert_eq!(classify(true, None, None), TerminalClass::PosixTtyDegraded);
    }

    #[test]
    fn empty_term_is_degraded() {
        assert_eq!(
            classify(true, Some(""), None),
            TerminalClass::PosixTtyDegraded
        );
    }

    #[test]
    fn wsl_kernel_is_degraded() {
        let wsl = "Linux version 5.15.90.1-microsoft-standard-WSL2";
        assert_eq!(
            classify(true, Some("xterm-256color"), Some(wsl)),
            TerminalClass::PosixTtyDegraded
        );
    }

    #[test]
    fn wsl_detection_is_case_insensitive() {
        let wsl = "Linux version 4.4.0-19041-Microsoft";
        assert_eq!(
            classify(true, Some("xterm"), Some(wsl)),
            TerminalClass::PosixTtyDegraded
        );
    }

    #[test]
    fn missing_proc_version_is_fine() {
        // macOS and the BSDs have no /proc/version.
        assert_eq!(
            classify(true, Some("xterm-256color"), None),
            TerminalClass::PosixTty
        );
    }

    #[test]
    fn detect_is_stable() {
        assert_eq!(detect(), detect());
    }

    #[test]
    fn degraded_forces_full_repaint() {
        assert!(!TerminalClass::PosixTtyDegraded.cursor_addressable());
        assert!(!TerminalClass::PosixTtyDegraded.uses_alt_screen());
    }

    #[test]
    fn healthy_classes_use_alt_screen() {
        assert!(TerminalClass::PosixTty.uses_alt_screen());
        assert!(TerminalClass::NativeConsole.uses_alt_screen());
    }

    #[test]
    fn native_console_skips_termios() {
        assert!(!TerminalClass::NativeConsole.uses_termios());
        assert!(TerminalClass::PosixTty.uses_termios());
        assert!(TerminalClass::PosixTtyDegraded.uses_termios());
    }
}

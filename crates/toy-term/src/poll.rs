// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Bounded-wait key polling.
//
// `poll(timeout)` is the primitive every game loop is built on: it
// returns a decoded key the moment one is available, or `None` once
// the timeout passes with no input. It never blocks indefinitely —
// the animation cadence is the caller's, not the terminal's.
//
// Two strategies, chosen at startup:
//
//   Raw   — stdin is in raw mode. `poll(2)` answers "is a byte
//           readable within this many milliseconds"; readable bytes
//           are read and fed to the decoder. Single-threaded: the
//           readiness check is a time-boxed syscall, not async I/O.
//
//   Lines — raw mode was unavailable (no interactive terminal). A
//           detached worker thread does the only thing a line-buffered
//           stream allows: blocking whole-line reads, shipped over a
//           channel that the poll side receives from with a timeout.
//           Latency and ergonomics are degraded by design — one
//           keypress per line, Enter required — and that is an
//           accepted trade-off, not a bug.
//
// The raw path also owns the escape disambiguation clock: when the
// decoder is holding a lone ESC, the next readiness wait is capped at
// the lookahead window, and expiry flushes the pending ESC as a real
// Escape keypress.
//
// End of input is terminal on both paths: once the stream is closed
// there will never be another keystroke, so after draining whatever
// was already decoded, every subsequent poll delivers `Interrupt` —
// the cancellation event all game loops already unwind on. Anything
// else (spinning on `None`, sleeping out timeouts forever) would
// strand a game that can never again receive a quit key.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::env::TerminalClass;
use crate::input::{Arrow, Key, Parser};

/// How long to wait for the continuation of an escape sequence before
/// declaring a lone ESC a standalone keypress.
///
/// Terminals emit arrow sequences as a burst, so even slow links
/// complete within a few milliseconds; 100ms is comfortably beyond
/// that while staying imperceptible for deliberate Escape presses.
pub const ESC_LOOKAHEAD: Duration = Duration::from_millis(100);

/// Read chunk size for the raw path. A keypress is 1–6 bytes; 64
/// covers a whole burst of held-down arrows.
const READ_BUF_SIZE: usize = 64;

// ─── Poller ─────────────────────────────────────────────────────────────────

/// Non-blocking key source for a game loop.
pub enum Poller {
    /// Raw-mode byte decoding via `poll(2)` readiness checks.
    Raw(RawPoller),
    /// Line-buffered fallback via a worker thread.
    Lines(LinePoller),
}

impl Poller {
    /// Raw-mode poller for the given terminal class. The caller must
    /// already hold the [`RawMode`](crate::terminal::RawMode) handle.
    #[must_use]
    pub fn raw(class: TerminalClass) -> Self {
        Self::Raw(RawPoller::new(class))
    }

    /// Line-buffered fallback poller. Spawns the worker thread.
    #[must_use]
    pub fn lines() -> Self {
        Self::Lines(LinePoller::spawn())
    }

    /// Wait up to `timeout` for the next key event.
    ///
    /// Returns `Ok(None)` if nothing arrived in time. Events are
    /// delivered in keystroke order; nothing is reordered across the
    /// escape lookahead window. A closed input stream delivers
    /// [`Key::Interrupt`] (after any already-decoded events), since no
    /// further input can ever arrive.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading stdin fails outright.
    pub fn poll(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        match self {
            Self::Raw(p) => p.poll(timeout),
            Self::Lines(p) => Ok(p.poll(timeout)),
        }
    }

    /// Whether this is the degraded line-buffered strategy.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Lines(_))
    }
}

// ─── Raw path ───────────────────────────────────────────────────────────────

/// Raw-mode poller: readiness-checked reads feeding the key decoder.
pub struct RawPoller {
    parser: Parser,
    /// Decoded events not yet handed out. One `advance` can produce
    /// several events; the caller takes one per poll.
    queue: VecDeque<Key>,
    /// When the decoder started holding an incomplete sequence.
    pending_since: Option<Instant>,
    /// Stdin has hit end-of-file; no more input will ever arrive.
    at_eof: bool,
}

impl RawPoller {
    #[must_use]
    fn new(class: TerminalClass) -> Self {
        Self {
            parser: Parser::new(class),
            queue: VecDeque::new(),
            pending_since: None,
            at_eof: false,
        }
    }

    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        if let Some(key) = self.queue.pop_front() {
            return Ok(Some(key));
        }
        if self.at_eof {
            // Closed stream: deliver cancellation, immediately and on
            // every subsequent poll. Waiting would be pointless and a
            // `None` here would let callers spin forever.
            return Ok(Some(Key::Interrupt));
        }

        let deadline = Instant::now() + timeout;

        loop {
            let now = Instant::now();

            // Resolve a pending escape whose lookahead has expired.
            if self.parser.has_pending() {
                let since = *self.pending_since.get_or_insert(now);
                if now.duration_since(since) >= ESC_LOOKAHEAD {
                    self.queue.extend(self.parser.flush());
                    self.pending_since = None;
                    if let Some(key) = self.queue.pop_front() {
                        return Ok(Some(key));
                    }
                }
            } else {
                self.pending_since = None;
            }

            if now >= deadline {
                return Ok(None);
            }

            // Wait for readability, bounded by both the caller's
            // deadline and the escape lookahead expiry.
            let mut wait = deadline - now;
            if let Some(since) = self.pending_since {
                let esc_left = ESC_LOOKAHEAD.saturating_sub(now.duration_since(since));
                wait = wait.min(esc_left);
            }

            if !stdin_readable(wait)? {
                continue;
            }

            let chunk = read_stdin()?;
            if chunk.is_empty() {
                // EOF — whatever is pending is all there will ever be;
                // once that drains, the stream delivers Interrupt.
                self.at_eof = true;
                self.queue.extend(self.parser.flush());
                self.pending_since = None;
                return Ok(Some(self.queue.pop_front().unwrap_or(Key::Interrupt)));
            }

            self.queue.extend(self.parser.advance(&chunk));
            if self.parser.has_pending() && self.pending_since.is_none() {
                self.pending_since = Some(Instant::now());
            }

            if let Some(key) = self.queue.pop_front() {
                return Ok(Some(key));
            }
        }
    }
}

/// Time-boxed readiness check on stdin.
#[cfg(unix)]
fn stdin_readable(timeout: Duration) -> io::Result<bool> {
    // poll(2) takes milliseconds; round up so a sub-millisecond wait
    // doesn't busy-spin.
    let millis = i32::try_from(timeout.as_millis().max(1)).unwrap_or(i32::MAX);

    let mut pfd = libc::pollfd {
        fd: libc::STDIN_FILENO,
        events: libc::POLLIN,
        revents: 0,
    };
    let ready = unsafe { libc::poll(&raw mut pfd, 1, millis) };

    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(ready > 0)
}

#[cfg(not(unix))]
fn stdin_readable(timeout: Duration) -> io::Result<bool> {
    // No readiness primitive — sleep out the wait. The line-buffered
    // fallback is the real strategy on these targets.
    thread::sleep(timeout);
    Ok(false)
}

/// Read whatever is immediately available from stdin.
///
/// Only called after a positive readiness check, so this does not
/// block. An empty return means EOF.
#[cfg(unix)]
fn read_stdin() -> io::Result<Vec<u8>> {
    let mut buf = [0u8; READ_BUF_SIZE];
    let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };

    if n < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Vec::new());
        }
        return Err(err);
    }

    #[allow(clippy::cast_sign_loss)] // n >= 0 checked above.
    Ok(buf[..n as usize].to_vec())
}

#[cfg(not(unix))]
fn read_stdin() -> io::Result<Vec<u8>> {
    Ok(Vec::new())
}

// ─── Line-buffered fallback ─────────────────────────────────────────────────

/// Fallback poller over a plain line-buffered stream.
///
/// A detached worker thread blocks in `read_line` and ships complete
/// lines over a channel; `poll` is a `recv_timeout` on that channel.
/// The worker cannot be interrupted mid-read, so it is abandoned at
/// process exit — one thread, process-lifetime bound, accepted. When
/// the worker exits (stdin closed), every later poll delivers
/// `Interrupt`.
///
/// Key mapping: the conventional movement letters (w/a/s/d, any case)
/// become arrows, an empty line is Enter, anything else delivers its
/// first character.
pub struct LinePoller {
    rx: Receiver<String>,
}

impl LinePoller {
    /// Spawn the worker thread and return the poller.
    ///
    /// # Panics
    ///
    /// Panics if the OS cannot spawn a thread (extremely rare).
    #[must_use]
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("line-reader".into())
            .spawn(move || {
                use std::io::BufRead;
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .expect("failed to spawn line reader thread");

        Self { rx }
    }

    fn poll(&mut self, timeout: Duration) -> Option<Key> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => map_line(&line),
            Err(RecvTimeoutError::Timeout) => None,
            // Worker gone means stdin is closed for good; that is a
            // cancellation, not an idle tick.
            Err(RecvTimeoutError::Disconnected) => Some(Key::Interrupt),
        }
    }
}

/// Map one typed line to a key event.
fn map_line(line: &str) -> Option<Key> {
    let mut chars = line.chars();
    let Some(first) = chars.next() else {
        return Some(Key::Enter);
    };

    let key = match first.to_ascii_lowercase() {
        '\u{3}' => Key::Interrupt,
        'w' => Key::Arrow(Arrow::Up),
        's' => Key::Arrow(Arrow::Down),
        'a' => Key::Arrow(Arrow::Left),
        'd' => Key::Arrow(Arrow::Right),
        _ => Key::Char(first),
    };
    Some(key)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

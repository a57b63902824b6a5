// SPDX-License-Identifier: MIT
//
// Key decoding state machine.
//
// Turns the raw input byte stream into the small closed set of events
// the toys care about: characters, arrows, Enter, Escape, and the
// interrupt. Everything a terminal can throw at us beyond that —
// function keys, Home/End, stray escape tails — is consumed and
// absorbed, never an error.
//
// Two arrow encodings are accepted per direction because both occur
// in practice: the CSI form `ESC [ A` (most terminals) and the SS3
// form `ESC O A` (application cursor mode, some terminal emulators).
// On the native console, special keys instead arrive as a two-byte
// prefix sequence (`0xE0` or `0x00` followed by a scancode).
//
// # Design
//
// The parser keeps a small internal byte buffer because escape
// sequences can span multiple reads. Feed bytes with
// [`Parser::advance`], collect events from the returned `Vec`. A lone
// ESC is ambiguous — standalone Escape key, or the start of a
// sequence? — so it is held pending; after the lookahead window
// passes with no continuation, call [`Parser::flush`] to resolve it
// as a real Escape keypress. Arrow recognition therefore always wins
// over standalone ESC, and no byte is ever consumed speculatively.

use crate::env::TerminalClass;

// ─── Event Types ────────────────────────────────────────────────────────────

/// Arrow key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// A decoded key event.
///
/// This set is closed on purpose: the toys need nothing more, and a
/// small event space keeps every consumer's match exhaustive.
/// "No input within the timeout" is expressed as `Option::None` by
/// the polling layer, not as a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A literal character (printable, or a pass-through control byte).
    Char(char),
    /// An arrow key, in either of its conventional encodings.
    Arrow(Arrow),
    /// Carriage return or line feed.
    Enter,
    /// A standalone Escape keypress (or an unrecognized escape tail).
    Escape,
    /// The terminal interrupt byte (Ctrl+C). Callers must treat this
    /// as "begin shutdown", not as a key to handle and continue.
    Interrupt,
}

/// The interrupt byte, watched for explicitly in every mode as
/// defense in depth — degraded hosts keep ISIG, healthy raw mode
/// does not, and the decoder must behave identically either way.
const INTERRUPT_BYTE: u8 = 0x03;

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Byte-stream key decoder.
///
/// Feed raw bytes via [`advance`](Parser::advance) and collect
/// [`Key`]s. Incomplete escape sequences are buffered internally and
/// resume when more bytes arrive; [`flush`](Parser::flush) resolves
/// whatever is still pending after the lookahead window.
pub struct Parser {
    /// Accumulated raw bytes waiting to be decoded.
    buf: Vec<u8>,
    /// Accept the native console's two-byte special-key prefix.
    native_prefix: bool,
}

impl Parser {
    /// Create a parser for the given terminal class.
    #[must_use]
    pub fn new(class: TerminalClass) -> Self {
        Self {
            buf: Vec::with_capacity(16),
            native_prefix: class == TerminalClass::NativeConsole,
        }
    }

    /// Feed raw input bytes and return all events decodable so far.
    ///
    /// Bytes forming an incomplete sequence stay in the internal
    /// buffer for the next `advance` call.
    pub fn advance(&mut self, data: &[u8]) -> Vec<Key> {
        self.buf.extend_from_slice(data);
        let mut events = Vec::new();
        let mut pos = 0;

        while pos < self.buf.len() {
            match self.try_parse(pos) {
                Parsed::Event(key, consumed) => {
                    events.push(key);
                    pos += consumed;
                }
                Parsed::Incomplete => break,
                Parsed::Skip(n) => pos += n,
            }
        }

        if pos > 0 {
            self.buf.drain(..pos);
        }

        events
    }

    /// Are there unconsumed bytes that might complete with more data?
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Resolve pending bytes as literal key events.
    ///
    /// Called after the lookahead window elapses with no continuation:
    /// a lone ESC becomes [`Key::Escape`], the interrupt byte still
    /// becomes [`Key::Interrupt`], printable bytes become
    /// [`Key::Char`], anything else is dropped.
    pub fn flush(&mut self) -> Vec<Key> {
        let mut events = Vec::new();
        for &byte in &self.buf {
            match byte {
                INTERRUPT_BYTE => events.push(Key::Interrupt),
                0x1B => events.push(Key::Escape),
                b'\r' | b'\n' => events.push(Key::Enter),
                b @ 0x20..=0x7E => events.push(Key::Char(b as char)),
                _ => {}
            }
        }
        self.buf.clear();
        events
    }

    /// Try to decode one event starting at `self.buf[pos]`.
    fn try_parse(&self, pos: usize) -> Parsed {
        let remaining = &self.buf[pos..];
        debug_assert!(!remaining.is_empty());

        match remaining[0] {
            INTERRUPT_BYTE => Parsed::Event(Key::Interrupt, 1),
            0x1B => parse_escape(remaining),
            // Coalesce CRLF into one Enter; lone CR needs its possible
            // LF partner before it can be consumed.
            b'\r' => match remaining.get(1) {
                Some(b'\n') => Parsed::Event(Key::Enter, 2),
                Some(_) => Parsed::Event(Key::Enter, 1),
                None => Parsed::Incomplete,
            },
            b'\n' => Parsed::Event(Key::Enter, 1),
            // Native console special-key prefix.
            0xE0 | 0x00 if self.native_prefix => parse_native_special(remaining),
            // ASCII, control bytes included — passed through literally.
            b @ 0x00..=0x7F => Parsed::Event(Key::Char(b as char), 1),
            // UTF-8 multi-byte, best effort.
            0xC0..=0xFF => parse_utf8(remaining),
            // Stray continuation byte — ignore.
            _ => Parsed::Skip(1),
        }
    }
}

/// Result of trying to decode one event from the buffer.
enum Parsed {
    /// Decoded an event, consuming `usize` bytes.
    Event(Key, usize),
    /// Sequence is incomplete — need more bytes.
    Incomplete,
    /// Unrecognized byte(s); skip `usize` bytes silently.
    Skip(usize),
}

// ── Escape sequences ────────────────────────────────────────────────────────

fn parse_escape(buf: &[u8]) -> Parsed {
    debug_assert_eq!(buf[0], 0x1B);

    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        // CSI: ESC [
        b'[' => parse_csi(buf),
        // SS3: ESC O
        b'O' => parse_ss3(buf),
        // Anything else: standalone Escape. The follower is NOT
        // consumed — it decodes as its own key on the next pass.
        _ => Parsed::Event(Key::Escape, 1),
    }
}

fn parse_csi(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'[');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    match buf[2] {
        b'A' => Parsed::Event(Key::Arrow(Arrow::Up), 3),
        b'B' => Parsed::Event(Key::Arrow(Arrow::Down), 3),
        b'C' => Parsed::Event(Key::Arrow(Arrow::Right), 3),
        b'D' => Parsed::Event(Key::Arrow(Arrow::Left), 3),
        _ => consume_csi_tail(buf),
    }
}

/// Consume a complete but unrecognized CSI sequence (Home, function
/// keys, anything this suite has no use for) and report it as a
/// single Escape, discarding the tail.
fn consume_csi_tail(buf: &[u8]) -> Parsed {
    // Parameter bytes 0x30..=0x3F, intermediate 0x20..=0x2F, final
    // 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            return Parsed::Event(Key::Escape, end + 1);
        }
        if !(0x20..=0x3F).contains(&b) {
            // Malformed mid-sequence byte: drop what we scanned.
            return Parsed::Event(Key::Escape, end);
        }
        end += 1;
    }
    Parsed::Incomplete
}

fn parse_ss3(buf: &[u8]) -> Parsed {
    debug_assert!(buf.len() >= 2 && buf[0] == 0x1B && buf[1] == b'O');

    if buf.len() < 3 {
        return Parsed::Incomplete;
    }

    match buf[2] {
        b'A' => Parsed::Event(Key::Arrow(Arrow::Up), 3),
        b'B' => Parsed::Event(Key::Arrow(Arrow::Down), 3),
        b'C' => Parsed::Event(Key::Arrow(Arrow::Right), 3),
        b'D' => Parsed::Event(Key::Arrow(Arrow::Left), 3),
        // Unrecognized SS3 tail (F1-F4 and friends): absorb it.
        _ => Parsed::Event(Key::Escape, 3),
    }
}

// ── Native console special keys ─────────────────────────────────────────────

fn parse_native_special(buf: &[u8]) -> Parsed {
    debug_assert!(buf[0] == 0xE0 || buf[0] == 0x00);

    if buf.len() < 2 {
        return Parsed::Incomplete;
    }

    match buf[1] {
        b'H' => Parsed::Event(Key::Arrow(Arrow::Up), 2),
        b'P' => Parsed::Event(Key::Arrow(Arrow::Down), 2),
        b'K' => Parsed::Event(Key::Arrow(Arrow::Left), 2),
        b'M' => Parsed::Event(Key::Arrow(Arrow::Right), 2),
        // Function keys etc. — not in the event set, drop the pair.
        _ => Parsed::Skip(2),
    }
}

// ── UTF-8 ──────────────────────────────────────────────────────────────────

fn parse_utf8(buf: &[u8]) -> Parsed {
    let expected = utf8_char_len(buf[0]);

    if expected == 0 {
        return Parsed::Skip(1);
    }
    if buf.len() < expected {
        return Parsed::Incomplete;
    }

    // Continuation bytes must be 0b10xxxxxx; malformed input degrades
    // to a skip, never a failed poll.
    for &b in &buf[1..expected] {
        if b & 0xC0 != 0x80 {
            return Parsed::Skip(1);
        }
    }

    std::str::from_utf8(&buf[..expected]).map_or(Parsed::Skip(1), |s| {
        s.chars().next().map_or(Parsed::Skip(expected), |ch| {
            Parsed::Event(Key::Char(ch), expected)
        })
    })
}

/// Expected byte length of a UTF-8 character from its lead byte.
/// Returns 0 for invalid lead bytes.
const fn utf8_char_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 0,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn posix_parser() -> Parser {
        Parser::new(TerminalClass::PosixTty)
    }

    /// Helper: parse bytes on a fresh POSIX parser.
    fn parse(data: &[u8]) -> Vec<Key> {
        posix_parser().advance(data)
    }

    /// Helper: parse bytes, expect exactly one event.
    fn parse_one(data: &[u8]) -> Key {
        let events = parse(data);
        assert_eq!(events.len(), 1, "expected 1 event, got {events:?}");
        events[0]
    }

    // ── Characters ──────────────────────────────────────────────────────

    #[test]
    fn ascii_single_char() {
        assert_eq!(parse_one(b"a"), Key::Char('a'));
    }

    #[test]
    fn ascii_multiple_chars() {
        assert_eq!(
            parse(b"wasd"),
            vec![
                Key::Char('w'),
                Key::Char('a'),
                Key::Char('s'),
                Key::Char('d')
            ]
        );
    }

    #[test]
    fn space_is_a_char() {
        assert_eq!(parse_one(b" "), Key::Char(' '));
    }

    #[test]
    fn utf8_two_byte_char() {
        assert_eq!(parse_one("é".as_bytes()), Key::Char('é'));
    }

    #[test]
    fn utf8_three_byte_char() {
        assert_eq!(parse_one("€".as_bytes()), Key::Char('€'));
    }

    #[test]
    fn utf8_split_across_reads() {
        let bytes = "é".as_bytes();
        let mut p = posix_parser();
        assert_eq!(p.advance(&bytes[..1]), vec![]);
        assert!(p.has_pending());
        assert_eq!(p.advance(&bytes[1..]), vec![Key::Char('é')]);
    }

    #[test]
    fn malformed_utf8_is_dropped_not_fatal() {
        // Lead byte promising 2 bytes, followed by a plain ASCII byte.
        assert_eq!(parse(b"\xC3a"), vec![Key::Char('a')]);
    }

    #[test]
    fn stray_continuation_byte_is_ignored() {
        assert_eq!(parse(b"\x80q"), vec![Key::Char('q')]);
    }

    // ── Enter ───────────────────────────────────────────────────────────

    #[test]
    fn enter_lf() {
        assert_eq!(parse_one(b"\n"), Key::Enter);
    }

    #[test]
    fn enter_cr_followed_by_key() {
        assert_eq!(parse(b"\rq"), vec![Key::Enter, Key::Char('q')]);
    }

    #[test]
    fn crlf_is_one_enter() {
        assert_eq!(parse(b"\r\n"), vec![Key::Enter]);
    }

    #[test]
    fn lone_cr_resolves_on_flush() {
        let mut p = posix_parser();
        assert_eq!(p.advance(b"\r"), vec![]);
        assert_eq!(p.flush(), vec![Key::Enter]);
    }

    // ── Interrupt ───────────────────────────────────────────────────────

    #[test]
    fn interrupt_byte_alone() {
        assert_eq!(parse_one(b"\x03"), Key::Interrupt);
    }

    #[test]
    fn interrupt_byte_mid_stream_never_becomes_char() {
        assert_eq!(
            parse(b"ab\x03cd"),
            vec![
                Key::Char('a'),
                Key::Char('b'),
                Key::Interrupt,
                Key::Char('c'),
                Key::Char('d')
            ]
        );
    }

    #[test]
    fn interrupt_survives_flush() {
        let mut p = posix_parser();
        p.buf.push(INTERRUPT_BYTE);
        assert_eq!(p.flush(), vec![Key::Interrupt]);
    }

    // ── Arrow keys: CSI encoding ────────────────────────────────────────

    #[test]
    fn csi_arrow_up() {
        assert_eq!(parse_one(b"\x1b[A"), Key::Arrow(Arrow::Up));
    }

    #[test]
    fn csi_arrow_down() {
        assert_eq!(parse_one(b"\x1b[B"), Key::Arrow(Arrow::Down));
    }

    #[test]
    fn csi_arrow_right() {
        assert_eq!(parse_one(b"\x1b[C"), Key::Arrow(Arrow::Right));
    }

    #[test]
    fn csi_arrow_left() {
        assert_eq!(parse_one(b"\x1b[D"), Key::Arrow(Arrow::Left));
    }

    // ── Arrow keys: SS3 encoding ────────────────────────────────────────

    #[test]
    fn ss3_arrow_up() {
        assert_eq!(parse_one(b"\x1bOA"), Key::Arrow(Arrow::Up));
    }

    #[test]
    fn ss3_arrow_down() {
        assert_eq!(parse_one(b"\x1bOB"), Key::Arrow(Arrow::Down));
    }

    #[test]
    fn ss3_arrow_right() {
        assert_eq!(parse_one(b"\x1bOC"), Key::Arrow(Arrow::Right));
    }

    #[test]
    fn ss3_arrow_left() {
        assert_eq!(parse_one(b"\x1bOD"), Key::Arrow(Arrow::Left));
    }

    #[test]
    fn arrow_consumes_exactly_its_bytes() {
        assert_eq!(
            parse(b"\x1b[Aq"),
            vec![Key::Arrow(Arrow::Up), Key::Char('q')]
        );
    }

    #[test]
    fn arrow_split_across_reads() {
        let mut p = posix_parser();
        assert_eq!(p.advance(b"\x1b"), vec![]);
        assert_eq!(p.advance(b"["), vec![]);
        assert_eq!(p.advance(b"A"), vec![Key::Arrow(Arrow::Up)]);
        assert!(!p.has_pending());
    }

    // ── Escape disambiguation ───────────────────────────────────────────

    #[test]
    fn lone_esc_is_held_pending() {
        let mut p = posix_parser();
        assert_eq!(p.advance(b"\x1b"), vec![]);
        assert!(p.has_pending());
    }

    #[test]
    fn lone_esc_flushes_to_escape() {
        let mut p = posix_parser();
        p.advance(b"\x1b");
        assert_eq!(p.flush(), vec![Key::Escape]);
        assert!(!p.has_pending());
    }

    #[test]
    fn esc_then_plain_char_is_escape_then_char() {
        assert_eq!(parse(b"\x1bq"), vec![Key::Escape, Key::Char('q')]);
    }

    #[test]
    fn unknown_csi_tail_becomes_escape() {
        // Home key: ESC [ 1 ~ — not in the event set.
        assert_eq!(parse(b"\x1b[1~"), vec![Key::Escape]);
    }

    #[test]
    fn unknown_csi_with_params_becomes_single_escape() {
        // Shift+Up: ESC [ 1 ; 2 A — modifiers are out of scope.
        assert_eq!(parse(b"\x1b[1;2A"), vec![Key::Escape]);
    }

    #[test]
    fn unknown_ss3_tail_becomes_escape() {
        // F1: ESC O P.
        assert_eq!(parse(b"\x1bOP"), vec![Key::Escape]);
    }

    #[test]
    fn escape_tail_is_discarded_not_replayed() {
        assert_eq!(parse(b"\x1b[5~x"), vec![Key::Escape, Key::Char('x')]);
    }

    // ── Native console encoding ─────────────────────────────────────────

    fn native_parse(data: &[u8]) -> Vec<Key> {
        Parser::new(TerminalClass::NativeConsole).advance(data)
    }

    #[test]
    fn native_arrow_up() {
        assert_eq!(native_parse(b"\xE0H"), vec![Key::Arrow(Arrow::Up)]);
    }

    #[test]
    fn native_arrow_down() {
        assert_eq!(native_parse(b"\xE0P"), vec![Key::Arrow(Arrow::Down)]);
    }

    #[test]
    fn native_arrow_left() {
        assert_eq!(native_parse(b"\xE0K"), vec![Key::Arrow(Arrow::Left)]);
    }

    #[test]
    fn native_arrow_right() {
        assert_eq!(native_parse(b"\xE0M"), vec![Key::Arrow(Arrow::Right)]);
    }

    #[test]
    fn native_nul_prefix_also_works() {
        assert_eq!(native_parse(b"\x00H"), vec![Key::Arrow(Arrow::Up)]);
    }

    #[test]
    fn native_function_key_is_dropped() {
        // 0x00 ; = F1 on the console — not in the event set.
        assert_eq!(native_parse(b"\x00;q"), vec![Key::Char('q')]);
    }

    #[test]
    fn posix_parser_treats_nul_as_char() {
        // Without the native prefix flag, 0x00 passes through.
        assert_eq!(parse(b"\x00"), vec![Key::Char('\0')]);
    }

    // ── End-to-end byte scripts ─────────────────────────────────────────

    #[test]
    fn mixed_stream_in_order() {
        assert_eq!(
            parse(b"a\x1b[Aq"),
            vec![Key::Char('a'), Key::Arrow(Arrow::Up), Key::Char('q')]
        );
    }

    #[test]
    fn burst_of_arrows_preserves_order() {
        assert_eq!(
            parse(b"\x1b[A\x1b[B\x1bOC\x1bOD"),
            vec![
                Key::Arrow(Arrow::Up),
                Key::Arrow(Arrow::Down),
                Key::Arrow(Arrow::Right),
                Key::Arrow(Arrow::Left)
            ]
        );
    }

    #[test]
    fn flush_on_empty_parser_is_empty() {
        assert_eq!(posix_parser().flush(), vec![]);
    }
}

// SPDX-License-Identifier: MIT
//
// Terminal paint. Arrow keys move the brush cursor; space toggles
// continuous drawing, 1-8 pick a color, B/N/M pick a brush, E toggles
// erase, C clears, S saves the canvas to `ascii_art.txt`, Q quits.

use std::io;
use std::time::Duration;

use toy_term::{Arrow, Error, Key, Session, ansi};

/// Saved artwork lands here, in the working directory.
pub const SAVE_FILE: &str = "ascii_art.txt";

/// Palette slots, selected with keys 1-8.
const PALETTE: [(&str, &str); 8] = [
    (ansi::RED, "Red"),
    (ansi::GREEN, "Green"),
    (ansi::YELLOW, "Yellow"),
    (ansi::BLUE, "Blue"),
    (ansi::MAGENTA, "Magenta"),
    (ansi::CYAN, "Cyan"),
    (ansi::WHITE, "White"),
    (ansi::GRAY, "Gray"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brush {
    Block,
    Circle,
    Shade,
}

impl Brush {
    const fn glyph(self, ascii: bool) -> char {
        match (self, ascii) {
            (Self::Block, false) => '█',
            (Self::Block, true) => '#',
            (Self::Circle, false) => '●',
            (Self::Circle, true) => 'O',
            (Self::Shade, false) => '▓',
            (Self::Shade, true) => '=',
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Block => "Block",
            Self::Circle => "Circle",
            Self::Shade => "Shade",
        }
    }
}

pub struct Paint {
    width: usize,
    height: usize,
    canvas: Vec<char>,
    /// Palette index per painted cell.
    colors: Vec<Option<usize>>,
    cursor: (usize, usize),
    color: usize,
    brush: Brush,
    drawing: bool,
    erasing: bool,
    ascii: bool,
}

impl Paint {
    #[must_use]
    pub fn new(width: u16, height: u16, ascii: bool) -> Self {
        let (width, height) = (usize::from(width), usize::from(height));
        Self {
            width,
            height,
            canvas: vec![' '; width * height],
            colors: vec![None; width * height],
            cursor: (width / 2, height / 2),
            color: 6, // White.
            brush: Brush::Block,
            drawing: false,
            erasing: false,
            ascii,
        }
    }

    /// Apply the current brush (or eraser) at the cursor.
    pub fn paint(&mut self) {
        let idx = self.cursor.1 * self.width + self.cursor.0;
        if self.erasing {
            self.canvas[idx] = ' ';
            self.colors[idx] = None;
        } else {
            self.canvas[idx] = self.brush.glyph(self.ascii);
            self.colors[idx] = Some(self.color);
        }
    }

    pub fn clear(&mut self) {
        self.canvas.fill(' ');
        self.colors.fill(None);
    }

    /// Move the cursor, clamped to the canvas; paints behind itself
    /// when continuous drawing is on.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor.0 as i32 + dx).clamp(0, self.width as i32 - 1);
        let y = (self.cursor.1 as i32 + dy).clamp(0, self.height as i32 - 1);
        self.cursor = (x as usize, y as usize);
        if self.drawing {
            self.paint();
        }
    }

    /// Toggle continuous drawing; turning it on paints immediately.
    pub fn toggle_drawing(&mut self) {
        self.drawing = !self.drawing;
        if self.drawing {
            self.paint();
        }
    }

    /// The canvas as plain text, one line per row, colors dropped.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.canvas.chunks(self.width) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }

    /// Write the canvas to [`SAVE_FILE`].
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the file cannot be written.
    pub fn save(&self) -> io::Result<()> {
        std::fs::write(SAVE_FILE, self.to_text())
    }

    #[must_use]
    pub fn render(&self, notice: Option<&str>) -> Vec<String> {
        let (top_l, top_r, bot_l, bot_r, horiz, vert) = if self.ascii {
            ('+', '+', '+', '+', '-', '|')
        } else {
            ('┌', '┐', '└', '┘', '─', '│')
        };

        let mut lines = Vec::with_capacity(self.height + 4);
        let horiz_run: String = std::iter::repeat(horiz).take(self.width).collect();
        lines.push(format!("{top_l}{horiz_run}{top_r}"));

        for y in 0..self.height {
            let mut line = String::new();
            line.push(vert);
            for x in 0..self.width {
                if (x, y) == self.cursor {
                    if self.erasing {
                        line.push_str(ansi::INVERT);
                        line.push(' ');
                        line.push_str(ansi::RESET);
                    } else {
                        line.push_str(PALETTE[self.color].0);
                        line.push(if self.ascii { '+' } else { '┼' });
                        line.push_str(ansi::RESET);
                    }
                } else {
                    let idx = y * self.width + x;
                    let ch = self.canvas[idx];
                    match self.colors[idx] {
                        Some(color) if ch != ' ' => {
                            line.push_str(PALETTE[color].0);
                            line.push(ch);
                            line.push_str(ansi::RESET);
                        }
                        _ => line.push(ch),
                    }
                }
            }
            line.push(vert);
            lines.push(line);
        }

        lines.push(format!("{bot_l}{horiz_run}{bot_r}"));
        lines.push(String::new());

        let (color_code, color_name) = PALETTE[self.color];
        let mode = if self.erasing { "ERASE" } else { "DRAW" };
        lines.push(format!(
            "Color: {color_code}{color_name}{} | Brush: {} | Mode: {mode}",
            ansi::RESET,
            self.brush.name()
        ));
        lines.push(
            "Arrows move, Space draw, C clear, 1-8 colors, B/N/M brush, E erase, S save, Q quit"
                .to_string(),
        );
        if let Some(notice) = notice {
            lines.push(notice.to_string());
        }
        lines
    }
}

/// Run the paint program until quit.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let size = session.size();
    let width = size.cols.saturating_sub(2).min(78);
    let height = size.rows.saturating_sub(5).min(28);
    let ascii = super::ascii_only(session.class());

    let mut paint = Paint::new(width, height, ascii);
    let mut notice: Option<String> = None;
    session.draw(&paint.render(None))?;

    loop {
        let Some(key) = session.poll_key(Duration::from_millis(50))? else {
            continue;
        };

        match key {
            Key::Char('q' | 'Q') | Key::Interrupt => break,
            Key::Char('c' | 'C') => paint.clear(),
            Key::Char(c @ '1'..='8') => {
                paint.color = c as usize - '1' as usize;
                paint.erasing = false;
            }
            Key::Char('b' | 'B') => paint.brush = Brush::Block,
            Key::Char('n' | 'N') => paint.brush = Brush::Circle,
            Key::Char('m' | 'M') => paint.brush = Brush::Shade,
            Key::Char('e' | 'E') => paint.erasing = !paint.erasing,
            Key::Char('s' | 'S') => {
                notice = Some(match paint.save() {
                    Ok(()) => format!("Saved to {SAVE_FILE}!"),
                    Err(e) => format!("Save failed: {e}"),
                });
            }
            Key::Char(' ') => paint.toggle_drawing(),
            Key::Arrow(Arrow::Up) => paint.move_cursor(0, -1),
            Key::Arrow(Arrow::Down) => paint.move_cursor(0, 1),
            Key::Arrow(Arrow::Left) => paint.move_cursor(-1, 0),
            Key::Arrow(Arrow::Right) => paint.move_cursor(1, 0),
            Key::Enter | Key::Escape | Key::Char(_) => {}
        }

        session.draw(&paint.render(notice.as_deref()))?;
        notice = None;
    }

    session.close()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> Paint {
        Paint::new(20, 10, false)
    }

    #[test]
    fn starts_blank_with_white_block_brush() {
        let p = canvas();
        assert_eq!(p.color, 6);
        assert_eq!(p.brush, Brush::Block);
        assert!(p.canvas.iter().all(|&c| c == ' '));
    }

    #[test]
    fn paint_places_the_brush_glyph() {
        let mut p = canvas();
        p.paint();
        let idx = 5 * 20 + 10; // Cursor starts centered.
        assert_eq!(p.canvas[idx], '█');
        assert_eq!(p.colors[idx], Some(6));
    }

    #[test]
    fn erase_blanks_the_cell() {
        let mut p = canvas();
        p.paint();
        p.erasing = true;
        p.paint();
        let idx = 5 * 20 + 10;
        assert_eq!(p.canvas[idx], ' ');
        assert_eq!(p.colors[idx], None);
    }

    #[test]
    fn continuous_draw_paints_along_the_path() {
        let mut p = canvas();
        p.toggle_drawing();
        p.move_cursor(1, 0);
        p.move_cursor(1, 0);
        assert_eq!(p.canvas.iter().filter(|&&c| c != ' ').count(), 3);
    }

    #[test]
    fn moving_without_drawing_leaves_no_trace() {
        let mut p = canvas();
        p.move_cursor(1, 0);
        p.move_cursor(0, 1);
        assert!(p.canvas.iter().all(|&c| c == ' '));
    }

    #[test]
    fn cursor_clamps_to_canvas() {
        let mut p = canvas();
        for _ in 0..30 {
            p.move_cursor(1, 0);
        }
        assert_eq!(p.cursor.0, 19);
        for _ in 0..30 {
            p.move_cursor(0, -1);
        }
        assert_eq!(p.cursor.1, 0);
    }

    #[test]
    fn clear_wipes_everything() {
        let mut p = canvas();
        p.toggle_drawing();
        p.move_cursor(1, 1);
        p.clear();
        assert!(p.canvas.iter().all(|&c| c == ' '));
        assert!(p.colors.iter().all(Option::is_none));
    }

    #[test]
    fn ascii_brushes_stay_ascii() {
        let mut p = Paint::new(20, 10, true);
        for brush in [Brush::Block, Brush::Circle, Brush::Shade] {
            p.brush = brush;
            p.paint();
            let idx = 5 * 20 + 10;
            assert!(p.canvas[idx].is_ascii());
        }
    }

    #[test]
    fn saved_text_is_plain_characters() {
        let mut p = canvas();
        p.paint();
        let text = p.to_text();
        assert_eq!(text.lines().count(), 10);
        assert!(text.lines().all(|l| l.chars().count() == 20));
        assert!(!text.contains('\x1b'), "save format carries no colors");
        assert!(text.contains('█'));
    }

    #[test]
    fn frame_shows_mode_and_color() {
        let p = canvas();
        let lines = p.render(None);
        assert!(lines.iter().any(|l| l.contains("Mode: DRAW")));
        assert!(lines.iter().any(|l| l.contains("White")));
    }

    #[test]
    fn erase_mode_inverts_the_cursor() {
        let mut p = canvas();
        p.erasing = true;
        let lines = p.render(None);
        assert!(lines.iter().any(|l| l.contains(ansi::INVERT)));
        assert!(lines.iter().any(|l| l.contains("Mode: ERASE")));
    }

    #[test]
    fn notice_line_is_appended() {
        let p = canvas();
        let lines = p.render(Some("Saved to ascii_art.txt!"));
        assert_eq!(lines.last().map(String::as_str), Some("Saved to ascii_art.txt!"));
    }
}

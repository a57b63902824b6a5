// SPDX-License-Identifier: MIT
//
// Tetris. Arrows or WASD move and rotate, space slams the piece down,
// P pauses. Clearing lines scores on the classic table and speeds the
// fall up every ten lines.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Arrow, Error, Key, Session, ansi};

const WIDTH: usize = 10;
const HEIGHT: usize = 20;

/// Points for clearing 1..=4 lines at once, multiplied by the level.
const LINE_SCORES: [u32; 4] = [40, 100, 300, 1200];

/// The seven tetrominoes in spawn orientation: I, O, T, S, Z, J, L.
const SHAPES: [&[&[u8]]; 7] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[0, 1, 0], &[1, 1, 1]],
    &[&[0, 1, 1], &[1, 1, 0]],
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[1, 0, 0], &[1, 1, 1]],
    &[&[0, 0, 1], &[1, 1, 1]],
];

/// Per-shape color, indexed like [`SHAPES`].
const COLORS: [&str; 7] = [
    ansi::CYAN,
    ansi::YELLOW,
    ansi::MAGENTA,
    ansi::GREEN,
    ansi::RED,
    ansi::BLUE,
    ansi::WHITE,
];

#[derive(Clone)]
pub struct Piece {
    kind: u8,
    cells: Vec<Vec<bool>>,
}

impl Piece {
    fn of(kind: u8) -> Self {
        let cells = SHAPES[kind as usize]
            .iter()
            .map(|row| row.iter().map(|&c| c != 0).collect())
            .collect();
        Self { kind, cells }
    }

    fn random(rng: &mut SmallRng) -> Self {
        Self::of(rng.random_range(0..SHAPES.len() as u8))
    }

    /// Clockwise quarter turn: transpose of the rows reversed.
    fn rotated(&self) -> Self {
        let rows = self.cells.len();
        let cols = self.cells[0].len();
        let cells = (0..cols)
            .map(|c| (0..rows).rev().map(|r| self.cells[r][c]).collect())
            .collect();
        Self {
            kind: self.kind,
            cells,
        }
    }
}

/// Spawn column centering the piece on the board.
fn spawn_x(piece: &Piece) -> i32 {
    ((WIDTH - piece.cells[0].len()) / 2) as i32
}

pub struct Tetris {
    board: [[Option<u8>; WIDTH]; HEIGHT],
    piece: Piece,
    next: Piece,
    x: i32,
    y: i32,
    score: u32,
    lines: u32,
    paused: bool,
    game_over: bool,
    rng: SmallRng,
}

impl Tetris {
    #[must_use]
    pub fn new(mut rng: SmallRng) -> Self {
        let piece = Piece::random(&mut rng);
        let next = Piece::random(&mut rng);
        let x = spawn_x(&piece);
        Self {
            board: [[None; WIDTH]; HEIGHT],
            piece,
            next,
            x,
            y: 0,
            score: 0,
            lines: 0,
            paused: false,
            game_over: false,
            rng,
        }
    }

    pub fn restart(&mut self) {
        self.board = [[None; WIDTH]; HEIGHT];
        self.score = 0;
        self.lines = 0;
        self.paused = false;
        self.game_over = false;
        self.piece = Piece::random(&mut self.rng);
        self.next = Piece::random(&mut self.rng);
        self.x = spawn_x(&self.piece);
        self.y = 0;
    }

    pub const fn toggle_pause(&mut self) {
        if !self.game_over {
            self.paused = !self.paused;
        }
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn level(&self) -> u32 {
        1 + self.lines / 10
    }

    /// Gravity period for the current level, floored at 100ms.
    #[must_use]
    pub fn fall_interval(&self) -> Duration {
        let ms = 1000u64
            .saturating_sub(u64::from(self.level() - 1) * 100)
            .max(100);
        Duration::from_millis(ms)
    }

    /// Whether the shape can sit at (x, y) without leaving the board
    /// or overlapping the stack.
    fn fits(&self, cells: &[Vec<bool>], x: i32, y: i32) -> bool {
        for (ry, row) in cells.iter().enumerate() {
            for (rx, &filled) in row.iter().enumerate() {
                if !filled {
                    continue;
                }
                let bx = x + rx as i32;
                let by = y + ry as i32;
                if bx < 0 || bx >= WIDTH as i32 || by < 0 || by >= HEIGHT as i32 {
                    return false;
                }
                if self.board[by as usize][bx as usize].is_some() {
                    return false;
                }
            }
        }
        true
    }

    /// Move the falling piece sideways, if there's room.
    pub fn shift(&mut self, dx: i32) {
        if !self.game_over && !self.paused && self.fits(&self.piece.cells, self.x + dx, self.y) {
            self.x += dx;
        }
    }

    /// Rotate clockwise, if the turned shape still fits. No wall
    /// kicks: a blocked rotation is simply ignored.
    pub fn rotate(&mut self) {
        if self.game_over || self.paused {
            return;
        }
        let rotated = self.piece.rotated();
        if self.fits(&rotated.cells, self.x, self.y) {
            self.piece = rotated;
        }
    }

    /// One gravity step. Returns false when the piece locked into the
    /// stack instead of descending.
    pub fn step(&mut self) -> bool {
        if self.game_over || self.paused {
            return true;
        }
        if self.fits(&self.piece.cells, self.x, self.y + 1) {
            self.y += 1;
            true
        } else {
            self.lock();
            false
        }
    }

    /// Drop straight to the bottom and lock.
    pub fn hard_drop(&mut self) {
        if self.game_over || self.paused {
            return;
        }
        while self.fits(&self.piece.cells, self.x, self.y + 1) {
            self.y += 1;
        }
        self.lock();
    }

    fn lock(&mut self) {
        for (ry, row) in self.piece.cells.iter().enumerate() {
            for (rx, &filled) in row.iter().enumerate() {
                if filled {
                    let bx = (self.x + rx as i32) as usize;
                    let by = (self.y + ry as i32) as usize;
                    self.board[by][bx] = Some(self.piece.kind);
                }
            }
        }
        self.clear_lines();

        self.piece = std::mem::replace(&mut self.next, Piece::random(&mut self.rng));
        self.x = spawn_x(&self.piece);
        self.y = 0;
        if !self.fits(&self.piece.cells, self.x, self.y) {
            self.game_over = true;
        }
    }

    fn clear_lines(&mut self) {
        let mut kept: Vec<[Option<u8>; WIDTH]> = self
            .board
            .iter()
            .filter(|row| row.iter().any(Option::is_none))
            .copied()
            .collect();
        let cleared = HEIGHT - kept.len();
        if cleared == 0 {
            return;
        }

        // Level at the moment of the clear, per the classic table.
        self.score += LINE_SCORES[(cleared - 1).min(3)] * self.level();
        self.lines += cleared as u32;

        while kept.len() < HEIGHT {
            kept.insert(0, [None; WIDTH]);
        }
        for (dst, src) in self.board.iter_mut().zip(kept) {
            *dst = src;
        }
    }

    /// What occupies a board cell right now: the falling piece first,
    /// then the locked stack.
    fn cell_kind(&self, bx: usize, by: usize) -> Option<u8> {
        if !self.game_over {
            for (ry, row) in self.piece.cells.iter().enumerate() {
                for (rx, &filled) in row.iter().enumerate() {
                    if filled && self.x + rx as i32 == bx as i32 && self.y + ry as i32 == by as i32
                    {
                        return Some(self.piece.kind);
                    }
                }
            }
        }
        self.board[by][bx]
    }

    #[must_use]
    pub fn render(&self, ascii: bool) -> Vec<String> {
        let (h, v, corners, block) = if ascii {
            ('-', '|', ['+', '+', '+', '+'], "[]")
        } else {
            ('─', '│', ['┌', '┐', '└', '┘'], "██")
        };

        let mut side = vec![
            format!("Score: {}", self.score),
            format!("Lines: {}", self.lines),
            format!("Level: {}", self.level()),
            String::new(),
            "Next:".to_string(),
        ];
        for row in &self.next.cells {
            let mut preview = String::from("  ");
            preview.push_str(COLORS[self.next.kind as usize]);
            for &filled in row {
                preview.push_str(if filled { block } else { "  " });
            }
            preview.push_str(ansi::RESET);
            side.push(preview);
        }

        let rule: String = h.to_string().repeat(WIDTH * 2);
        let mut lines = vec![
            "TETRIS".to_string(),
            format!("{}{rule}{}", corners[0], corners[1]),
        ];

        for by in 0..HEIGHT {
            let mut line = String::new();
            line.push(v);
            for bx in 0..WIDTH {
                match self.cell_kind(bx, by) {
                    Some(kind) => {
                        line.push_str(COLORS[kind as usize]);
                        line.push_str(block);
                        line.push_str(ansi::RESET);
                    }
                    None => line.push_str("  "),
                }
            }
            line.push(v);
            if let Some(info) = side.get(by) {
                line.push_str("  ");
                line.push_str(info);
            }
            lines.push(line);
        }
        lines.push(format!("{}{rule}{}", corners[2], corners[3]));

        lines.push(String::new());
        lines.push(
            "Controls: Arrows/AD move, W/Up rotate, S/Down drop, Space slam, P pause, Q quit"
                .to_string(),
        );

        if self.game_over {
            lines.push(String::new());
            lines.push(format!("{}*** GAME OVER ***{}", ansi::RED, ansi::RESET));
            lines.push(format!("Final Score: {}", self.score));
            lines.push("Press R to restart, Q to quit".to_string());
        } else if self.paused {
            lines.push(String::new());
            lines.push(format!(
                "{}PAUSED - press P to resume{}",
                ansi::YELLOW,
                ansi::RESET
            ));
        }

        lines
    }
}

/// Play tetris until quit.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails mid-game.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let ascii = super::ascii_only(session.class());

    let mut game = Tetris::new(SmallRng::from_os_rng());
    let mut last_fall = Instant::now();
    session.draw(&game.render(ascii))?;

    loop {
        let mut dirty = false;

        match session.poll_key(Duration::from_millis(10))? {
            Some(Key::Char('q' | 'Q') | Key::Interrupt) => return session.close(),
            Some(Key::Char('r' | 'R')) if game.is_over() => {
                game.restart();
                last_fall = Instant::now();
                dirty = true;
            }
            Some(Key::Char('p' | 'P')) => {
                game.toggle_pause();
                dirty = true;
            }
            Some(Key::Arrow(Arrow::Left) | Key::Char('a' | 'A')) => {
                game.shift(-1);
                dirty = true;
            }
            Some(Key::Arrow(Arrow::Right) | Key::Char('d' | 'D')) => {
                game.shift(1);
                dirty = true;
            }
            Some(Key::Arrow(Arrow::Up) | Key::Char('w' | 'W')) => {
                game.rotate();
                dirty = true;
            }
            Some(Key::Arrow(Arrow::Down) | Key::Char('s' | 'S')) => {
                game.step();
                last_fall = Instant::now();
                dirty = true;
            }
            Some(Key::Char(' ')) => {
                game.hard_drop();
                last_fall = Instant::now();
                dirty = true;
            }
            Some(_) | None => {}
        }

        if !game.is_over() && !game.paused && last_fall.elapsed() >= game.fall_interval() {
            game.step();
            last_fall = Instant::now();
            dirty = true;
        }

        if dirty {
            session.draw(&game.render(ascii))?;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn game() -> Tetris {
        Tetris::new(SmallRng::seed_from_u64(7))
    }

    fn grid(piece: &Piece) -> Vec<Vec<u8>> {
        piece
            .cells
            .iter()
            .map(|row| row.iter().map(|&c| u8::from(c)).collect())
            .collect()
    }

    #[test]
    fn t_piece_rotates_clockwise() {
        let t = Piece::of(2);
        let turned = t.rotated();
        assert_eq!(grid(&turned), vec![vec![1, 0], vec![1, 1], vec![1, 0]]);
    }

    #[test]
    fn four_rotations_restore_the_shape() {
        for kind in 0..SHAPES.len() as u8 {
            let p = Piece::of(kind);
            let back = p.rotated().rotated().rotated().rotated();
            assert_eq!(grid(&p), grid(&back), "shape {kind}");
        }
    }

    #[test]
    fn pieces_spawn_centered() {
        assert_eq!(spawn_x(&Piece::of(0)), 3); // I, width 4
        assert_eq!(spawn_x(&Piece::of(1)), 4); // O, width 2
    }

    #[test]
    fn shift_stops_at_the_walls() {
        let mut g = game();
        g.piece = Piece::of(1); // O, width 2.
        g.x = 0;
        g.shift(-1);
        assert_eq!(g.x, 0);
        g.x = (WIDTH - 2) as i32;
        g.shift(1);
        assert_eq!(g.x, (WIDTH - 2) as i32);
    }

    #[test]
    fn blocked_rotation_is_ignored() {
        let mut g = game();
        g.piece = Piece::of(0); // I, lying flat.
        g.x = 0;
        g.y = (HEIGHT - 1) as i32;
        // Standing up would poke through the floor.
        g.rotate();
        assert_eq!(grid(&g.piece), vec![vec![1, 1, 1, 1]]);
    }

    #[test]
    fn step_descends_until_the_floor() {
        let mut g = game();
        g.piece = Piece::of(1);
        g.next = Piece::of(1);
        g.x = 4;
        g.y = 0;
        assert!(g.step());
        assert_eq!(g.y, 1);
    }

    #[test]
    fn hard_drop_locks_into_the_stack() {
        let mut g = game();
        g.piece = Piece::of(1); // O at columns 4-5.
        g.next = Piece::of(0);
        g.x = 4;
        g.y = 0;
        g.hard_drop();
        assert_eq!(g.board[HEIGHT - 1][4], Some(1));
        assert_eq!(g.board[HEIGHT - 1][5], Some(1));
        assert_eq!(g.board[HEIGHT - 2][4], Some(1));
        // The next piece took over at the top.
        assert_eq!(g.y, 0);
        assert!(!g.is_over());
    }

    #[test]
    fn single_line_clear_scores_forty() {
        let mut g = game();
        g.board[HEIGHT - 1] = [Some(0); WIDTH];
        g.clear_lines();
        assert_eq!(g.score(), 40);
        assert_eq!(g.lines, 1);
        assert!(g.board[HEIGHT - 1].iter().all(Option::is_none));
    }

    #[test]
    fn four_line_clear_scores_a_tetris() {
        let mut g = game();
        for row in HEIGHT - 4..HEIGHT {
            g.board[row] = [Some(0); WIDTH];
        }
        g.clear_lines();
        assert_eq!(g.score(), 1200);
        assert_eq!(g.lines, 4);
    }

    #[test]
    fn stack_above_a_cleared_line_falls() {
        let mut g = game();
        g.board[HEIGHT - 2][0] = Some(3);
        g.board[HEIGHT - 1] = [Some(0); WIDTH];
        g.clear_lines();
        assert_eq!(g.board[HEIGHT - 1][0], Some(3));
        assert_eq!(g.board[HEIGHT - 2][0], None);
    }

    #[test]
    fn level_rises_every_ten_lines_and_speed_bottoms_out() {
        let mut g = game();
        assert_eq!(g.level(), 1);
        assert_eq!(g.fall_interval(), Duration::from_millis(1000));
        g.lines = 10;
        assert_eq!(g.level(), 2);
        assert_eq!(g.fall_interval(), Duration::from_millis(900));
        g.lines = 200;
        assert_eq!(g.fall_interval(), Duration::from_millis(100));
    }

    #[test]
    fn blocked_spawn_ends_the_game() {
        let mut g = game();
        g.next = Piece::of(1); // O spawning at columns 4-5.
        g.board[0][4] = Some(0);
        g.piece = Piece::of(1);
        g.x = 0;
        g.y = (HEIGHT - 2) as i32;
        g.step(); // Locks, then the spawn collides.
        assert!(g.is_over());
    }

    #[test]
    fn pause_freezes_the_piece() {
        let mut g = game();
        g.piece = Piece::of(1);
        g.x = 4;
        g.y = 0;
        g.toggle_pause();
        g.shift(1);
        assert!(g.step());
        g.rotate();
        assert_eq!((g.x, g.y), (4, 0));
    }

    #[test]
    fn frame_shows_score_and_next_piece() {
        let g = game();
        let lines = g.render(false);
        assert!(lines.iter().any(|l| l.contains("Score: 0")));
        assert!(lines.iter().any(|l| l.contains("Next:")));
        assert!(lines.iter().any(|l| l.contains('┌')));
    }

    #[test]
    fn ascii_frame_has_no_unicode() {
        let g = game();
        for line in g.render(true) {
            assert!(
                line.chars().all(|c| c.is_ascii() || c == '\u{1b}'),
                "non-ascii glyph in {line:?}"
            );
        }
    }
}

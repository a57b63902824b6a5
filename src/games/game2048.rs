// SPDX-License-Identifier: MIT
//
// 2048. Slide tiles with the arrow keys or WASD; equal neighbors
// merge, each move spawns a new tile, and the game ends when the
// board is stuck. Reaching the 2048 tile wins, with the option to
// keep going.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Arrow, Error, Key, Session, ansi};

const SIZE: usize = 4;
const WIN_TILE: u32 = 2048;
/// Chance that a freshly spawned tile is a 4 instead of a 2.
const FOUR_CHANCE: f64 = 0.1;

/// Tile foreground color by value. Values double, so the palette
/// cycles after the win tile.
fn tile_color(value: u32) -> &'static str {
    match value {
        2 => ansi::WHITE,
        4 => ansi::YELLOW,
        8 => ansi::CYAN,
        16 => ansi::GREEN,
        32 => ansi::BLUE,
        64 => ansi::MAGENTA,
        128 => ansi::RED,
        256 => ansi::YELLOW,
        512 => ansi::CYAN,
        1024 => ansi::MAGENTA,
        _ => ansi::RED,
    }
}

/// Slide one row toward index 0, merging equal neighbors once per
/// move. Returns the new row and the points gained.
fn slide_row(row: [u32; SIZE]) -> ([u32; SIZE], u32) {
    let mut out = [0u32; SIZE];
    let mut gained = 0;
    let mut at = 0;
    let mut just_merged = false;

    for &v in row.iter().filter(|&&v| v != 0) {
        if at > 0 && out[at - 1] == v && !just_merged {
            out[at - 1] *= 2;
            gained += out[at - 1];
            just_merged = true;
        } else {
            out[at] = v;
            at += 1;
            just_merged = false;
        }
    }
    (out, gained)
}

pub struct Game2048 {
    board: [[u32; SIZE]; SIZE],
    score: u32,
    won: bool,
    /// Set when the player chooses to continue past the win tile.
    keep_playing: bool,
    rng: SmallRng,
}

impl Game2048 {
    #[must_use]
    pub fn new(rng: SmallRng) -> Self {
        let mut game = Self {
            board: [[0; SIZE]; SIZE],
            score: 0,
            won: false,
            keep_playing: false,
            rng,
        };
        game.spawn_tile();
        game.spawn_tile();
        game
    }

    /// Slide the whole board in one direction. Returns whether
    /// anything moved; the caller spawns the follow-up tile.
    pub fn shift(&mut self, dir: Arrow) -> bool {
        let before = self.board;

        match dir {
            Arrow::Left => {
                for row in &mut self.board {
                    let (slid, gained) = slide_row(*row);
                    *row = slid;
                    self.score += gained;
                }
            }
            Arrow::Right => {
                for row in &mut self.board {
                    row.reverse();
                    let (mut slid, gained) = slide_row(*row);
                    slid.reverse();
                    *row = slid;
                    self.score += gained;
                }
            }
            Arrow::Up | Arrow::Down => {
                for col in 0..SIZE {
                    let mut line = [0u32; SIZE];
                    for (i, cell) in line.iter_mut().enumerate() {
                        *cell = self.board[i][col];
                    }
                    if dir == Arrow::Down {
                        line.reverse();
                    }
                    let (mut slid, gained) = slide_row(line);
                    if dir == Arrow::Down {
                        slid.reverse();
                    }
                    for (i, &v) in slid.iter().enumerate() {
                        self.board[i][col] = v;
                    }
                    self.score += gained;
                }
            }
        }

        let moved = self.board != before;
        if moved && !self.won && self.highest() >= WIN_TILE {
            self.won = true;
        }
        moved
    }

    /// Drop a 2 (or occasionally a 4) on a random empty cell.
    pub fn spawn_tile(&mut self) {
        let empties: Vec<(usize, usize)> = (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.board[r][c] == 0)
            .collect();
        let Some(&(r, c)) = empties.get(self.rng.random_range(0..empties.len().max(1))) else {
            return;
        };
        self.board[r][c] = if self.rng.random_bool(FOUR_CHANCE) { 4 } else { 2 };
    }

    /// Whether any move can still change the board.
    #[must_use]
    pub fn moves_available(&self) -> bool {
        for r in 0..SIZE {
            for c in 0..SIZE {
                if self.board[r][c] == 0 {
                    return true;
                }
                if c + 1 < SIZE && self.board[r][c] == self.board[r][c + 1] {
                    return true;
                }
                if r + 1 < SIZE && self.board[r][c] == self.board[r + 1][c] {
                    return true;
                }
            }
        }
        false
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.moves_available()
    }

    /// Win banner is up and the player hasn't chosen to continue yet.
    #[must_use]
    pub const fn awaiting_continue(&self) -> bool {
        self.won && !self.keep_playing
    }

    pub const fn continue_playing(&mut self) {
        self.keep_playing = true;
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    fn highest(&self) -> u32 {
        self.board.iter().flatten().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn render(&self, ascii: bool) -> Vec<String> {
        let (h, v, cross) = if ascii { ('-', '|', '+') } else { ('─', '│', '┼') };
        let rule = |l: char, m: char, r: char| {
            let seg = h.to_string().repeat(6);
            format!("{l}{seg}{m}{seg}{m}{seg}{m}{seg}{r}")
        };
        let (top, mid, bot) = if ascii {
            (rule(cross, cross, cross), rule(cross, cross, cross), rule(cross, cross, cross))
        } else {
            (rule('┌', '┬', '┐'), rule('├', cross, '┤'), rule('└', '┴', '┘'))
        };

        let mut lines = vec![
            "2048 - Join the numbers!".to_string(),
            format!("Score: {}", self.score),
            String::new(),
            top,
        ];

        for (r, row) in self.board.iter().enumerate() {
            let mut line = String::new();
            line.push(v);
            for &cell in row {
                if cell == 0 {
                    line.push_str("      ");
                } else {
                    line.push_str(tile_color(cell));
                    line.push_str(&format!("{cell:^6}"));
                    line.push_str(ansi::RESET);
                }
                line.push(v);
            }
            lines.push(line);
            if r + 1 < SIZE {
                lines.push(mid.clone());
            }
        }
        lines.push(bot);

        lines.push(String::new());
        lines.push("Controls: Arrow keys or WASD to move, Q to quit".to_string());

        if self.awaiting_continue() {
            lines.push(String::new());
            lines.push(format!(
                "{}*** YOU WIN! ***{} Press C to keep going, Q to quit",
                ansi::YELLOW,
                ansi::RESET
            ));
        } else if self.is_over() {
            lines.push(String::new());
            lines.push(format!("{}*** GAME OVER ***{}", ansi::RED, ansi::RESET));
            lines.push(format!("Final Score: {}", self.score));
            lines.push("Press any key to exit...".to_string());
        }

        lines
    }
}

/// Play 2048 until quit or the board is stuck.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails mid-game.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let ascii = super::ascii_only(session.class());

    let mut game = Game2048::new(SmallRng::from_os_rng());
    session.draw(&game.render(ascii))?;

    while !game.is_over() {
        let Some(key) = session.poll_key(Duration::from_millis(100))? else {
            continue;
        };

        let dir = match key {
            Key::Char('q' | 'Q') | Key::Interrupt => return session.close(),
            Key::Char('c' | 'C') if game.awaiting_continue() => {
                game.continue_playing();
                session.draw(&game.render(ascii))?;
                continue;
            }
            Key::Arrow(a) => Some(a),
            Key::Char('w' | 'W') => Some(Arrow::Up),
            Key::Char('s' | 'S') => Some(Arrow::Down),
            Key::Char('a' | 'A') => Some(Arrow::Left),
            Key::Char('d' | 'D') => Some(Arrow::Right),
            _ => None,
        };

        if let Some(dir) = dir {
            // Moves stall while the win banner waits for a decision.
            if !game.awaiting_continue() && game.shift(dir) {
                game.spawn_tile();
            }
            session.draw(&game.render(ascii))?;
        }
    }

    // Final frame with the game-over banner, then wait for any key.
    session.draw(&game.render(ascii))?;
    while session.poll_key(Duration::from_millis(100))?.is_none() {}
    session.close()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn empty() -> Game2048 {
        let mut g = Game2048::new(SmallRng::seed_from_u64(7));
        g.board = [[0; SIZE]; SIZE];
        g.score = 0;
        g
    }

    #[test]
    fn new_board_has_two_tiles() {
        let g = Game2048::new(SmallRng::seed_from_u64(7));
        let tiles = g.board.iter().flatten().filter(|&&v| v != 0).count();
        assert_eq!(tiles, 2);
        assert!(g.board.iter().flatten().all(|&v| v == 0 || v == 2 || v == 4));
    }

    #[test]
    fn slide_compacts_toward_the_front() {
        assert_eq!(slide_row([0, 2, 0, 4]), ([2, 4, 0, 0], 0));
    }

    #[test]
    fn slide_merges_equal_neighbors() {
        assert_eq!(slide_row([2, 2, 0, 0]), ([4, 0, 0, 0], 4));
        assert_eq!(slide_row([2, 2, 2, 2]), ([4, 4, 0, 0], 8));
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        // The 4 produced by 2+2 must not immediately eat the next 4.
        assert_eq!(slide_row([2, 2, 4, 0]), ([4, 4, 0, 0], 4));
    }

    #[test]
    fn shift_right_mirrors_shift_left() {
        let mut g = empty();
        g.board[0] = [2, 2, 0, 4];
        assert!(g.shift(Arrow::Right));
        assert_eq!(g.board[0], [0, 0, 4, 4]);
        assert_eq!(g.score(), 4);
    }

    #[test]
    fn shift_up_slides_columns() {
        let mut g = empty();
        g.board[2][1] = 2;
        g.board[3][1] = 2;
        assert!(g.shift(Arrow::Up));
        assert_eq!(g.board[0][1], 4);
        assert_eq!(g.board[2][1], 0);
    }

    #[test]
    fn no_op_shift_reports_no_movement() {
        let mut g = empty();
        g.board[0][0] = 2;
        assert!(!g.shift(Arrow::Left));
        assert!(!g.shift(Arrow::Up));
    }

    #[test]
    fn spawn_fills_an_empty_cell_with_2_or_4() {
        let mut g = empty();
        g.spawn_tile();
        let tiles: Vec<u32> = g.board.iter().flatten().copied().filter(|&v| v != 0).collect();
        assert_eq!(tiles.len(), 1);
        assert!(tiles[0] == 2 || tiles[0] == 4);
    }

    #[test]
    fn stuck_board_is_game_over() {
        let mut g = empty();
        g.board = [
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ];
        assert!(g.is_over());
        // One merge possibility brings it back to life.
        g.board[0][0] = 4;
        assert!(!g.is_over());
    }

    #[test]
    fn reaching_the_win_tile_raises_the_banner() {
        let mut g = empty();
        g.board[0] = [1024, 1024, 0, 0];
        assert!(g.shift(Arrow::Left));
        assert!(g.awaiting_continue());
        g.continue_playing();
        assert!(!g.awaiting_continue());
    }

    #[test]
    fn frame_shows_score_and_grid() {
        let mut g = empty();
        g.board[0][0] = 2;
        g.score = 42;
        let lines = g.render(false);
        assert!(lines[1].contains("Score: 42"));
        assert!(lines.iter().any(|l| l.contains('┌')));
        assert!(lines.iter().any(|l| l.contains("  2   ")));
    }

    #[test]
    fn ascii_frame_has_no_unicode() {
        let g = Game2048::new(SmallRng::seed_from_u64(7));
        for line in g.render(true) {
            assert!(
                line.chars().all(|c| c.is_ascii() || c == '\u{1b}'),
                "non-ascii glyph in {line:?}"
            );
        }
    }
}

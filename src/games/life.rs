// SPDX-License-Identifier: MIT
//
// Conway's Game of Life on a bounded grid. While paused, the arrow
// keys move a cell cursor; space toggles the cell under it, and 1-5
// stamp a pattern preset centered there. P runs the simulation,
// C clears, R randomizes, Q quits.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Arrow, Error, Key, Session, ansi};

const STEP_INTERVAL: Duration = Duration::from_millis(100);

/// Pattern presets, stamped centered on the cursor. Cells are rows of
/// 0/1, top to bottom.
const PATTERNS: [(&str, &[&[u8]]); 5] = [
    ("Glider", &[&[0, 1, 0], &[0, 0, 1], &[1, 1, 1]]),
    ("Blinker", &[&[1], &[1], &[1]]),
    ("Toad", &[&[0, 1, 1, 1], &[1, 1, 1, 0]]),
    (
        "Beacon",
        &[&[1, 1, 0, 0], &[1, 1, 0, 0], &[0, 0, 1, 1], &[0, 0, 1, 1]],
    ),
    (
        "Pulsar",
        &[
            &[0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0],
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0],
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            &[0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[1, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1],
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
            &[0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0],
        ],
    ),
];

pub struct Life {
    width: usize,
    height: usize,
    grid: Vec<bool>,
    cursor: (usize, usize),
    playing: bool,
    generation: u64,
}

impl Life {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let (width, height) = (usize::from(width), usize::from(height));
        Self {
            width,
            height,
            grid: vec![false; width * height],
            cursor: (width / 2, height / 2),
            playing: false,
            generation: 0,
        }
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> bool {
        self.grid[y * self.width + x]
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.grid.iter().filter(|&&c| c).count()
    }

    fn neighbors(&self, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx >= 0
                    && ny >= 0
                    && (nx as usize) < self.width
                    && (ny as usize) < self.height
                    && self.cell(nx as usize, ny as usize)
                {
                    count += 1;
                }
            }
        }
        count
    }

    /// Advance one generation.
    pub fn step(&mut self) {
        let mut next = vec![false; self.width * self.height];
        for y in 0..self.height {
            for x in 0..self.width {
                let n = self.neighbors(x, y);
                next[y * self.width + x] = if self.cell(x, y) {
                    n == 2 || n == 3
                } else {
                    n == 3
                };
            }
        }
        self.grid = next;
        self.generation += 1;
    }

    pub fn toggle(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.grid[y * self.width + x] = !self.grid[y * self.width + x];
        }
    }

    pub fn clear(&mut self) {
        self.grid.fill(false);
        self.generation = 0;
    }

    pub fn randomize(&mut self, rng: &mut SmallRng) {
        for cell in &mut self.grid {
            *cell = rng.random_bool(0.3);
        }
        self.generation = 0;
    }

    /// Stamp pattern preset `index` (0-4) centered on the cursor;
    /// cells falling outside the grid are clipped.
    pub fn stamp(&mut self, index: usize) {
        let Some((_, pattern)) = PATTERNS.get(index) else {
            return;
        };
        let ph = pattern.len() as i32;
        let pw = pattern.first().map_or(0, |row| row.len()) as i32;
        let start_x = self.cursor.0 as i32 - pw / 2;
        let start_y = self.cursor.1 as i32 - ph / 2;

        for (y, row) in pattern.iter().enumerate() {
            for (x, &cell) in row.iter().enumerate() {
                let px = start_x + x as i32;
                let py = start_y + y as i32;
                if px >= 0 && py >= 0 && (px as usize) < self.width && (py as usize) < self.height
                {
                    self.grid[py as usize * self.width + px as usize] = cell != 0;
                }
            }
        }
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let x = (self.cursor.0 as i32 + dx).clamp(0, self.width as i32 - 1);
        let y = (self.cursor.1 as i32 + dy).clamp(0, self.height as i32 - 1);
        self.cursor = (x as usize, y as usize);
    }

    #[must_use]
    pub fn render(&self, ascii: bool) -> Vec<String> {
        let alive = if ascii { '#' } else { '█' };
        let (top_l, top_r, bot_l, bot_r, horiz, vert, dot) = if ascii {
            ('+', '+', '+', '+', '-', '|', '.')
        } else {
            ('┌', '┐', '└', '┘', '─', '│', '·')
        };

        let mut lines = Vec::with_capacity(self.height + 4);
        let horiz_run: String = std::iter::repeat(horiz).take(self.width).collect();
        lines.push(format!("{top_l}{horiz_run}{top_r}"));

        for y in 0..self.height {
            let mut line = String::new();
            line.push(vert);
            for x in 0..self.width {
                if (x, y) == self.cursor && !self.playing {
                    let ch = if self.cell(x, y) { alive } else { dot };
                    line.push_str(ansi::YELLOW);
                    line.push(ch);
                    line.push_str(ansi::RESET);
                } else if self.cell(x, y) {
                    // Cells about to survive draw brighter than ones
                    // about to die.
                    let n = self.neighbors(x, y);
                    let color = if n == 2 || n == 3 {
                        ansi::GREEN
                    } else {
                        ansi::GRAY
                    };
                    line.push_str(color);
                    line.push(alive);
                    line.push_str(ansi::RESET);
                } else {
                    line.push(' ');
                }
            }
            line.push(vert);
            lines.push(line);
        }

        lines.push(format!("{bot_l}{horiz_run}{bot_r}"));
        lines.push(String::new());
        let status = if self.playing { "PLAYING" } else { "PAUSED" };
        lines.push(format!(
            "Gen: {} | Pop: {} | Status: {}",
            self.generation,
            self.population(),
            status
        ));
        lines.push(
            "Arrows move, Space toggle, P play/pause, C clear, R random, 1-5 patterns, Q quit"
                .to_string(),
        );
        lines
    }
}

/// Run the Life editor/simulator until quit.
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

    let mut rng = SmallRng::from_os_rng();
    let mut game = Life::new(width, height);
    let mut last_step = Instant::now();
    let mut dirty = true;

    loop {
        if let Some(key) = session.poll_key(Duration::from_millis(10))? {
            dirty = true;
            match key {
                Key::Char('q' | 'Q') | Key::Interrupt => break,
                Key::Char('p' | 'P') => game.playing = !game.playing,
                Key::Char('c' | 'C') => game.clear(),
                Key::Char('r' | 'R') => game.randomize(&mut rng),
                Key::Char(c @ '1'..='5') => game.stamp(c as usize - '1' as usize),
                _ if !game.playing => match key {
                    Key::Arrow(Arrow::Up) => game.move_cursor(0, -1),
                    Key::Arrow(Arrow::Down) => game.move_cursor(0, 1),
                    Key::Arrow(Arrow::Left) => game.move_cursor(-1, 0),
                    Key::Arrow(Arrow::Right) => game.move_cursor(1, 0),
                    Key::Char(' ') => game.toggle(game.cursor.0, game.cursor.1),
                    _ => {}
                },
                _ => {}
            }
        }

        if game.playing && last_step.elapsed() >= STEP_INTERVAL {
            game.step();
            last_step = Instant::now();
            dirty = true;
        }

        if dirty {
            session.draw(&game.render(ascii))?;
            dirty = false;
        }
    }

    session.close()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Snake. Arrow keys or WASD to steer, Q to quit. The snake speeds up
// a little with every piece of food; hitting a wall or yourself ends
// the game.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Arrow, Error, Key, Session, ansi};

const START_TICK: Duration = Duration::from_millis(150);
const MIN_TICK: Duration = Duration::from_millis(50);
const TICK_STEP: Duration = Duration::from_millis(5);

struct Glyphs {
    top: char,
    side: char,
    corners: [char; 4], // tl, tr, bl, br
    head: char,
    body: char,
    food: char,
}

const UNICODE: Glyphs = Glyphs {
    top: '═',
    side: '║',
    corners: ['╔', '╗', '╚', '╝'],
    head: '●',
    body: '○',
    food: '♦',
};

const ASCII: Glyphs = Glyphs {
    top: '=',
    side: '|',
    corners: ['+', '+', '+', '+'],
    head: 'O',
    body: 'o',
    food: '*',
};

pub struct Snake {
    width: i32,
    height: i32,
    /// Head first.
    body: VecDeque<(i32, i32)>,
    dir: (i32, i32),
    food: (i32, i32),
    score: u32,
    game_over: bool,
    tick: Duration,
    rng: SmallRng,
}

impl Snake {
    #[must_use]
    pub fn new(width: u16, height: u16, rng: SmallRng) -> Self {
        let (width, height) = (i32::from(width), i32::from(height));
        let mut game = Self {
            width,
            height,
            body: VecDeque::from([(width / 2, height / 2)]),
            dir: (1, 0),
            food: (0, 0),
            score: 0,
            game_over: false,
            tick: START_TICK,
            rng,
        };
        game.food = game.spawn_food();
        game
    }

    /// Random interior cell not occupied by the snake.
    fn spawn_food(&mut self) -> (i32, i32) {
        loop {
            let food = (
                self.rng.random_range(1..self.width - 1),
                self.rng.random_range(1..self.height - 1),
            );
            if !self.body.contains(&food) {
                return food;
            }
        }
    }

    /// Change direction; a reversal onto yourself is ignored.
    pub fn steer(&mut self, dx: i32, dy: i32) {
        if (dx, dy) != (-self.dir.0, -self.dir.1) {
            self.dir = (dx, dy);
        }
    }

    /// Advance one tick.
    pub fn step(&mut self) {
        let head = self.body[0];
        let next = (head.0 + self.dir.0, head.1 + self.dir.1);

        let hit_wall = next.0 <= 0
            || next.0 >= self.width - 1
            || next.1 <= 0
            || next.1 >= self.height - 1;
        if hit_wall || self.body.contains(&next) {
            self.game_over = true;
            return;
        }

        self.body.push_front(next);
        if next == self.food {
            self.score += 10;
            self.food = self.spawn_food();
            self.tick = MIN_TICK.max(self.tick.saturating_sub(TICK_STEP));
        } else {
            self.body.pop_back();
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn render(&self, ascii: bool) -> Vec<String> {
        let g = if ascii { &ASCII } else { &UNICODE };
        let mut lines = Vec::with_capacity(self.height as usize + 4);

        for y in 0..self.height {
            let mut line = String::new();
            for x in 0..self.width {
                let border = x == 0 || x == self.width - 1 || y == 0 || y == self.height - 1;
                if border {
                    let ch = match (x == 0, y == 0, x == self.width - 1, y == self.height - 1) {
                        (true, true, ..) => g.corners[0],
                        (_, true, true, _) => g.corners[1],
                        (true, _, _, true) => g.corners[2],
                        (_, _, true, true) => g.corners[3],
                        (_, true, ..) | (.., true) => g.top,
                        _ => g.side,
                    };
                    line.push_str(ansi::BLUE);
                    line.push(ch);
                    line.push_str(ansi::RESET);
                } else if (x, y) == self.body[0] {
                    line.push_str(ansi::GREEN);
                    line.push(g.head);
                    line.push_str(ansi::RESET);
                } else if self.body.contains(&(x, y)) {
                    line.push_str(ansi::GREEN);
                    line.push(g.body);
                    line.push_str(ansi::RESET);
                } else if (x, y) == self.food {
                    line.push_str(ansi::RED);
                    line.push(g.food);
                    line.push_str(ansi::RESET);
                } else {
                    line.push(' ');
                }
            }
            lines.push(line);
        }

        lines.push(String::new());
        lines.push(format!("Score: {}", self.score));
        lines.push("Controls: Arrow keys or WASD to move, Q to quit".to_string());

        if self.game_over {
            let banner = format!("{}*** GAME OVER ***{}", ansi::RED, ansi::RESET);
            let pad = (self.width as usize).saturating_sub(ansi::visible_width(&banner)) / 2;
            lines.push(String::new());
            lines.push(format!("{}{banner}", " ".repeat(pad)));
            lines.push(format!("Final Score: {}", self.score));
            lines.push("Press any key to exit...".to_string());
        }

        lines
    }
}

/// Play snake until quit or game over.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails mid-game.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let size = session.size();
    let width = size.cols.saturating_sub(2).min(60);
    let height = size.rows.saturating_sub(5).min(25);
    let ascii = super::ascii_only(session.class());

    let mut game = Snake::new(width, height, SmallRng::from_os_rng());
    let mut last_step = Instant::now();
    session.draw(&game.render(ascii))?;

    while !game.is_over() {
        match session.poll_key(Duration::from_millis(10))? {
            Some(Key::Char('q' | 'Q') | Key::Interrupt) => {
                return session.close();
            }
            Some(Key::Arrow(Arrow::Up) | Key::Char('w' | 'W')) => game.steer(0, -1),
            Some(Key::Arrow(Arrow::Down) | Key::Char('s' | 'S')) => game.steer(0, 1),
            Some(Key::Arrow(Arrow::Left) | Key::Char('a' | 'A')) => game.steer(-1, 0),
            Some(Key::Arrow(Arrow::Right) | Key::Char('d' | 'D')) => game.steer(1, 0),
            Some(_) | None => {}
        }

        if last_step.elapsed() >= game.tick {
            game.step();
            session.draw(&game.render(ascii))?;
            last_step = Instant::now();
        }
    }

    // Final frame with the game-over banner, then wait for any key.
    session.draw(&game.render(ascii))?;
    while session.poll_key(Duration::from_millis(100))?.is_none() {}
    session.close()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

// SPDX-License-Identifier: MIT
//
// Bouncing balls. A physics toy more than a game: balls fall, bounce
// off the box walls with damping, and shove each other apart when they
// collide. Space adds a ball, G flips gravity, T toggles trails,
// C clears the box, Q quits.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Error, Key, Session, ansi};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const TRAIL_LEN: usize = 5;
const GRAVITY: f64 = 0.1;
const DAMPING: f64 = 0.9;

const BALL_GLYPHS: [char; 6] = ['●', '○', '◉', '◎', '◯', '⬤'];
const BALL_GLYPHS_ASCII: [char; 4] = ['o', 'O', '0', '@'];

const BALL_COLORS: [&str; 7] = [
    ansi::RED,
    ansi::GREEN,
    ansi::YELLOW,
    ansi::BLUE,
    ansi::MAGENTA,
    ansi::CYAN,
    ansi::WHITE,
];

pub struct Ball {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    glyph: char,
    color: &'static str,
    /// Oldest first.
    trail: VecDeque<(i32, i32)>,
}

impl Ball {
    fn update(&mut self, width: f64, height: f64, gravity: f64, rng: &mut SmallRng) {
        self.trail.push_back((self.x as i32, self.y as i32));
        if self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }

        self.x += self.vx;
        self.y += self.vy;
        self.vy += gravity;

        if self.x <= 0.0 || self.x >= width - 1.0 {
            self.vx = -self.vx * DAMPING;
            self.x = self.x.clamp(0.0, width - 1.0);
        }
        if self.y <= 0.0 || self.y >= height - 1.0 {
            self.vy = -self.vy * DAMPING;
            self.y = self.y.clamp(0.0, height - 1.0);
            // Kick a ball that has damped to a standstill on the floor.
            if self.vy.abs() < 0.1 {
                self.vy = rng.random_range(-0.5..-0.2);
            }
        }
    }
}

pub struct Bounce {
    width: usize,
    height: usize,
    balls: Vec<Ball>,
    gravity: f64,
    trails: bool,
    ascii: bool,
    rng: SmallRng,
}

impl Bounce {
    #[must_use]
    pub fn new(width: u16, height: u16, ascii: bool, rng: SmallRng) -> Self {
        let mut toy = Self {
            width: usize::from(width),
            height: usize::from(height),
            balls: Vec::new(),
            gravity: GRAVITY,
            trails: true,
            ascii,
            rng,
        };
        for _ in 0..3 {
            toy.add_ball();
        }
        toy
    }

    pub fn add_ball(&mut self) {
        let glyph = if self.ascii {
            BALL_GLYPHS_ASCII[self.rng.random_range(0..BALL_GLYPHS_ASCII.len())]
        } else {
            BALL_GLYPHS[self.rng.random_range(0..BALL_GLYPHS.len())]
        };
        self.balls.push(Ball {
            x: f64::from(self.rng.random_range(5..self.width as i32 - 5)),
            y: f64::from(self.rng.random_range(2..10.min(self.height as i32 - 1))),
            vx: self.rng.random_range(-2.0..2.0),
            vy: self.rng.random_range(-1.0..1.0),
            glyph,
            color: BALL_COLORS[self.rng.random_range(0..BALL_COLORS.len())],
            trail: VecDeque::new(),
        });
    }

    pub fn clear(&mut self) {
        self.balls.clear();
    }

    pub fn flip_gravity(&mut self) {
        self.gravity = -self.gravity;
    }

    /// Advance all balls one frame, then resolve ball-to-ball
    /// collisions with a velocity swap and a separating nudge.
    pub fn update(&mut self) {
        let (w, h) = (self.width as f64, self.height as f64);
        for ball in &mut self.balls {
            ball.update(w, h, self.gravity, &mut self.rng);
        }

        for i in 0..self.balls.len() {
            for j in i + 1..self.balls.len() {
                let dx = self.balls[j].x - self.balls[i].x;
                let dy = self.balls[j].y - self.balls[i].y;
                let dist = dx.hypot(dy);
                if dist >= 2.0 {
                    continue;
                }

                let (vx_i, vy_i) = (self.balls[i].vx, self.balls[i].vy);
                let (vx_j, vy_j) = (self.balls[j].vx, self.balls[j].vy);
                self.balls[i].vx = vx_j * 0.9;
                self.balls[i].vy = vy_j * 0.9;
                self.balls[j].vx = vx_i * 0.9;
                self.balls[j].vy = vy_i * 0.9;

                if dist > 0.0 {
                    let (nx, ny) = (dx / dist, dy / dist);
                    self.balls[i].x = (self.balls[i].x - nx).clamp(0.0, w - 1.0);
                    self.balls[i].y = (self.balls[i].y - ny).clamp(0.0, h - 1.0);
                    self.balls[j].x = (self.balls[j].x + nx).clamp(0.0, w - 1.0);
                    self.balls[j].y = (self.balls[j].y + ny).clamp(0.0, h - 1.0);
                }
            }
        }
    }

    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let (top_l, top_r, bot_l, bot_r, horiz, vert) = if self.ascii {
            ('+', '+', '+', '+', '-', '|')
        } else {
            ('┌', '┐', '└', '┘', '─', '│')
        };

        // Cell buffer: glyph plus optional color.
        let mut cells: Vec<(char, Option<&'static str>)> =
            vec![(' ', None); self.width * self.height];

        for ball in &self.balls {
            if self.trails {
                let len = ball.trail.len();
                for (i, &(tx, ty)) in ball.trail.iter().enumerate() {
                    if tx >= 0 && ty >= 0 && (tx as usize) < self.width && (ty as usize) < self.height
                    {
                        let age = i as f64 / len as f64;
                        let glyph = if age < 0.3 {
                            '.'
                        } else if age < 0.6 {
                            if self.ascii { '.' } else { '·' }
                        } else if self.ascii {
                            '*'
                        } else {
                            '•'
                        };
                        cells[ty as usize * self.width + tx as usize] = (glyph, None);
                    }
                }
            }

            let (x, y) = (ball.x as i32, ball.y as i32);
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                cells[y as usize * self.width + x as usize] = (ball.glyph, Some(ball.color));
            }
        }

        let mut lines = Vec::with_capacity(self.height + 4);
        let horiz_run: String = std::iter::repeat(horiz).take(self.width).collect();
        lines.push(format!("{top_l}{horiz_run}{top_r}"));

        for row in cells.chunks(self.width) {
            let mut line = String::new();
            line.push(vert);
            for &(ch, color) in row {
                match color {
                    Some(code) => {
                        line.push_str(code);
                        line.push(ch);
                        line.push_str(ansi::RESET);
                    }
                    None => line.push(ch),
                }
            }
            line.push(vert);
            lines.push(line);
        }

        lines.push(format!("{bot_l}{horiz_run}{bot_r}"));
        lines.push(format!(
            "Balls: {} | Gravity: {:.2} | Trails: {}",
            self.balls.len(),
            self.gravity,
            if self.trails { "ON" } else { "OFF" }
        ));
        lines.push(
            "Controls: Space add ball, C clear, G toggle gravity, T toggle trails, Q quit"
                .to_string(),
        );
        lines
    }
}

/// Run the bouncing-ball animation until quit.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let size = session.size();
    let width = size.cols.saturating_sub(2).min(78);
    let height = size.rows.saturating_sub(3).min(28);
    let ascii = super::ascii_only(session.class());

    let mut toy = Bounce::new(width, height, ascii, SmallRng::from_os_rng());
    let mut last_frame = Instant::now();
    session.draw(&toy.render())?;

    loop {
        match session.poll_key(Duration::from_millis(10))? {
            Some(Key::Char('q' | 'Q') | Key::Interrupt) => break,
            Some(Key::Char(' ')) => toy.add_ball(),
            Some(Key::Char('c' | 'C')) => toy.clear(),
            Some(Key::Char('g' | 'G')) => toy.flip_gravity(),
            Some(Key::Char('t' | 'T')) => toy.trails = !toy.trails,
            Some(_) | None => {}
        }

        if last_frame.elapsed() >= FRAME_INTERVAL {
            toy.update();
            session.draw(&toy.render())?;
            last_frame = Instant::now();
        }
    }

    session.close()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toy() -> Bounce {
        Bounce::new(60, 20, false, SmallRng::seed_from_u64(3))
    }

    #[test]
    fn starts_with_three_balls() {
        let t = toy();
        assert_eq!(t.balls.len(), 3);
        for ball in &t.balls {
            assert!(ball.x >= 0.0 && ball.x < 60.0);
            assert!(ball.y >= 0.0 && ball.y < 20.0);
        }
    }

    #[test]
    fn balls_stay_inside_the_box() {
        let mut t = toy();
        for _ in 0..500 {
            t.update();
        }
        for ball in &t.balls {
            assert!((0.0..60.0).contains(&ball.x), "x escaped: {}", ball.x);
            assert!((0.0..20.0).contains(&ball.y), "y escaped: {}", ball.y);
        }
    }

    #[test]
    fn floor_bounce_reverses_vertical_velocity() {
        let mut t = toy();
        t.balls.truncate(1);
        t.balls[0].x = 30.0;
        t.balls[0].y = 19.0;
        t.balls[0].vx = 0.0;
        t.balls[0].vy = 2.0;
        t.update();
        assert!(t.balls[0].vy < 0.0, "vy still {}", t.balls[0].vy);
    }

    #[test]
    fn gravity_flips_sign() {
        let mut t = toy();
        t.flip_gravity();
        assert!(t.gravity < 0.0);
        t.flip_gravity();
        assert!(t.gravity > 0.0);
    }

    #[test]
    fn trail_is_capped() {
        let mut t = toy();
        for _ in 0..20 {
            t.update();
        }
        for ball in &t.balls {
            assert!(ball.trail.len() <= TRAIL_LEN);
        }
    }

    #[test]
    fn touching_balls_separate() {
        let mut t = toy();
        t.balls.truncate(2);
        for ball in &mut t.balls {
            ball.x = 30.0;
            ball.y = 10.0;
            ball.vx = 0.0;
            ball.vy = 0.0;
        }
        t.balls[1].x = 30.5;
        t.update();
        let dx = t.balls[1].x - t.balls[0].x;
        assert!(dx.abs() > 0.5, "balls still overlapping: dx {dx}");
    }

    #[test]
    fn clear_removes_all_balls() {
        let mut t = toy();
        t.clear();
        assert!(t.balls.is_empty());
        let lines = t.render();
        assert!(lines.iter().any(|l| l.contains("Balls: 0")));
    }

    #[test]
    fn frame_shape_matches_the_box() {
        let t = toy();
        let lines = t.render();
        assert_eq!(lines.len(), 20 + 2 + 2); // rows + borders + status.
        assert!(lines[0].starts_with('┌'));
    }

    #[test]
    fn balls_render_in_color() {
        let t = toy();
        let body = t.render().join("\n");
        assert!(body.contains(ansi::RESET));
    }

    #[test]
    fn trails_can_be_turned_off() {
        let mut t = toy();
        t.balls.truncate(1);
        t.trails = false;
        for _ in 0..10 {
            t.update();
        }
        let body = t.render().join("\n");
        assert!(!body.contains('·') && !body.contains('•'));
    }
}

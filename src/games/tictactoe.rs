// SPDX-License-Identifier: MIT
//
// Tic-tac-toe against a minimax opponent. You are X, the computer is
// O; keys 1-9 claim the matching square, R restarts, Q quits. The
// opponent plays perfectly after a randomized opening, so a draw is
// the best you can do.

use std::thread;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use toy_term::{Error, Key, Session, ansi};

/// How long the computer pretends to think before moving.
const THINK_DELAY: Duration = Duration::from_millis(500);

/// Corner and center squares the opening move is drawn from.
const OPENINGS: [usize; 5] = [0, 2, 4, 6, 8];

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    XWins,
    OWins,
    Draw,
}

/// The completed line and its owner, if any.
fn line_winner(board: &[Cell; 9]) -> Option<(Cell, [usize; 3])> {
    LINES.iter().find_map(|&line| {
        let mark = board[line[0]];
        (mark != Cell::Empty && board[line[1]] == mark && board[line[2]] == mark)
            .then_some((mark, line))
    })
}

/// Minimax over the full game tree. O maximizes; faster wins score
/// higher (and slower losses less badly) via the depth term.
fn minimax(board: &mut [Cell; 9], depth: i32, maximizing: bool) -> i32 {
    match line_winner(board) {
        Some((Cell::O, _)) => return 10 - depth,
        Some((Cell::X, _)) => return depth - 10,
        _ => {}
    }
    if board.iter().all(|&c| c != Cell::Empty) {
        return 0;
    }

    let (mark, init) = if maximizing {
        (Cell::O, i32::MIN)
    } else {
        (Cell::X, i32::MAX)
    };
    let mut best = init;
    for i in 0..9 {
        if board[i] == Cell::Empty {
            board[i] = mark;
            let score = minimax(board, depth + 1, !maximizing);
            board[i] = Cell::Empty;
            best = if maximizing { best.max(score) } else { best.min(score) };
        }
    }
    best
}

pub struct TicTacToe {
    board: [Cell; 9],
    rng: SmallRng,
}

impl TicTacToe {
    #[must_use]
    pub fn new(rng: SmallRng) -> Self {
        Self {
            board: [Cell::Empty; 9],
            rng,
        }
    }

    pub fn reset(&mut self) {
        self.board = [Cell::Empty; 9];
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match line_winner(&self.board) {
            Some((Cell::X, _)) => Outcome::XWins,
            Some((Cell::O, _)) => Outcome::OWins,
            _ if self.board.iter().all(|&c| c != Cell::Empty) => Outcome::Draw,
            _ => Outcome::InProgress,
        }
    }

    /// Place the player's X. Returns whether the square was free.
    pub fn play(&mut self, idx: usize) -> bool {
        if idx < 9 && self.board[idx] == Cell::Empty {
            self.board[idx] = Cell::X;
            true
        } else {
            false
        }
    }

    /// The computer's O move: a randomized opening while the board is
    /// nearly empty, perfect play after that.
    pub fn computer_move(&mut self) {
        if self.outcome() != Outcome::InProgress {
            return;
        }

        let occupied = self.board.iter().filter(|&&c| c != Cell::Empty).count();
        if occupied <= 1 {
            loop {
                let pick = OPENINGS[self.rng.random_range(0..OPENINGS.len())];
                if self.board[pick] == Cell::Empty {
                    self.board[pick] = Cell::O;
                    return;
                }
            }
        }

        let mut best = (i32::MIN, None);
        for i in 0..9 {
            if self.board[i] == Cell::Empty {
                self.board[i] = Cell::O;
                let score = minimax(&mut self.board, 0, false);
                self.board[i] = Cell::Empty;
                if score > best.0 {
                    best = (score, Some(i));
                }
            }
        }
        if let Some(i) = best.1 {
            self.board[i] = Cell::O;
        }
    }

    #[must_use]
    pub fn render(&self, ascii: bool, thinking: bool) -> Vec<String> {
        let (h, v, cross) = if ascii { ("---", '|', '+') } else { ("───", '│', '┼') };
        let winning = line_winner(&self.board).map(|(_, line)| line);

        let square = |idx: usize| -> String {
            let highlight = winning.is_some_and(|line| line.contains(&idx));
            match self.board[idx] {
                Cell::Empty => format!("{}{}{}", ansi::GRAY, idx + 1, ansi::RESET),
                Cell::X if highlight => format!("{}X{}", ansi::GREEN, ansi::RESET),
                Cell::X => format!("{}X{}", ansi::RED, ansi::RESET),
                Cell::O if highlight => format!("{}O{}", ansi::GREEN, ansi::RESET),
                Cell::O => format!("{}O{}", ansi::BLUE, ansi::RESET),
            }
        };

        let mut lines = vec!["Tic-Tac-Toe - You are X".to_string(), String::new()];
        for row in 0..3 {
            let base = row * 3;
            lines.push(format!(
                " {} {v} {} {v} {}",
                square(base),
                square(base + 1),
                square(base + 2)
            ));
            if row < 2 {
                lines.push(format!("{h}{cross}{h}{cross}{h}"));
            }
        }

        lines.push(String::new());
        let status = match self.outcome() {
            Outcome::InProgress if thinking => "Computer is thinking...".to_string(),
            Outcome::InProgress => "Your turn: press 1-9".to_string(),
            Outcome::XWins => format!("{}You win!{}", ansi::GREEN, ansi::RESET),
            Outcome::OWins => format!("{}Computer wins!{}", ansi::RED, ansi::RESET),
            Outcome::Draw => format!("{}It's a draw!{}", ansi::YELLOW, ansi::RESET),
        };
        lines.push(status);
        lines.push(String::new());
        lines.push("Controls: 1-9 to place, R to restart, Q to quit".to_string());
        lines
    }
}

/// Play tic-tac-toe until quit.
///
/// # Errors
///
/// Returns an error if the terminal session cannot start or I/O to it
/// fails mid-game.
pub fn run() -> Result<(), Error> {
    let mut session = Session::new()?;
    let ascii = super::ascii_only(session.class());

    let mut game = TicTacToe::new(SmallRng::from_os_rng());
    session.draw(&game.render(ascii, false))?;

    loop {
        let Some(key) = session.poll_key(Duration::from_millis(100))? else {
            continue;
        };

        match key {
            Key::Char('q' | 'Q') | Key::Interrupt => return session.close(),
            Key::Char('r' | 'R') => game.reset(),
            Key::Char(c @ '1'..='9') if game.outcome() == Outcome::InProgress => {
                let idx = c as usize - '1' as usize;
                if game.play(idx) && game.outcome() == Outcome::InProgress {
                    session.draw(&game.render(ascii, true))?;
                    thread::sleep(THINK_DELAY);
                    game.computer_move();
                }
            }
            _ => continue,
        }

        session.draw(&game.render(ascii, false))?;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

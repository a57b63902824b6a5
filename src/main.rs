// SPDX-License-Identifier: MIT
//
// terminal-toys launcher. A plain line-mode menu: list the toys,
// number selects, Q quits. Each toy opens its own full-screen session
// and hands the terminal back on return, so the menu never needs raw
// mode itself.

use std::io::{self, BufRead, Write};

use terminal_toys::games;

type Toy = fn() -> Result<(), toy_term::Error>;

const TOYS: [(&str, &str, Toy); 7] = [
    ("snake", "Snake - Classic snake game", games::snake::run),
    ("tetris", "Tetris - Falling blocks puzzle", games::tetris::run),
    ("2048", "2048 - Sliding tile puzzle", games::game2048::run),
    (
        "tictactoe",
        "Tic-Tac-Toe - Play against the computer",
        games::tictactoe::run,
    ),
    (
        "life",
        "Conway's Game of Life - Cellular automaton",
        games::life::run,
    ),
    (
        "paint",
        "ASCII Paint - Terminal drawing application",
        games::paint::run,
    ),
    (
        "bounce",
        "Bouncing Balls - Physics-based animation",
        games::bounce::run,
    ),
];

fn print_menu(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Terminal Toys")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "\nAvailable games and animations:\n")?;
    for (i, (_, desc, _)) in TOYS.iter().enumerate() {
        writeln!(out, "  {}. {desc}", i + 1)?;
    }
    writeln!(out, "\n  Q. Quit")?;
    writeln!(out, "\n{}", "=".repeat(50))?;
    Ok(())
}

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print_menu(&mut stdout)?;

    loop {
        write!(stdout, "\nSelect a toy (1-{}, Q to quit): ", TOYS.len())?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF.
        }
        let choice = line.trim();

        if choice.eq_ignore_ascii_case("q") {
            writeln!(stdout, "Thanks for playing!")?;
            break;
        }

        match choice.parse::<usize>() {
            Ok(n) if (1..=TOYS.len()).contains(&n) => {
                let (name, _, run) = TOYS[n - 1];
                if let Err(e) = run() {
                    eprintln!("{name}: {e}");
                }
                print_menu(&mut stdout)?;
            }
            _ => writeln!(stdout, "Invalid choice. Please try again.")?,
        }
    }

    Ok(())
}

// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::tictactoe::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tictactoe: {e}");
            ExitCode::FAILURE
        }
    }
}

// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::tetris::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tetris: {e}");
            ExitCode::FAILURE
        }
    }
}

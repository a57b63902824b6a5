// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::game2048::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("2048: {e}");
            ExitCode::FAILURE
        }
    }
}

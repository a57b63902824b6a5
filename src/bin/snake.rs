// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::snake::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("snake: {e}");
            ExitCode::FAILURE
        }
    }
}

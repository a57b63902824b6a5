// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::bounce::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bounce: {e}");
            ExitCode::FAILURE
        }
    }
}

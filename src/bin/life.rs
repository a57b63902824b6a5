// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::life::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("life: {e}");
            ExitCode::FAILURE
        }
    }
}

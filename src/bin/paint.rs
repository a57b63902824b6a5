// SPDX-License-Identifier: MIT

use std::process::ExitCode;

fn main() -> ExitCode {
    match terminal_toys::games::paint::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("paint: {e}");
            ExitCode::FAILURE
        }
    }
}

// SPDX-License-Identifier: MIT
//
// terminal-toys — a suite of terminal animations and games.
//
// All terminal mechanics (detection, raw input, frame rendering) live
// in the `toy-term` crate; the modules here are pure game state plus a
// loop over `Session::poll_key` / `Session::draw`.

pub mod games;

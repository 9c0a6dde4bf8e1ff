//! Text primitives shared by the lintmark crates.

pub mod chars;
pub mod line_ending;
pub mod path;

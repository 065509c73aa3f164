//! Entry points for front ends.
//!
//! - [`compress_directory`]: run in the background and render progress on the terminal

mod compress;

pub use compress::*;

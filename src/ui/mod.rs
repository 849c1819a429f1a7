//! Terminal presentation: command input, the event loop and rendering.
//!
//! - `input.rs` - command parsing and dispatch
//! - `loop_runner.rs` - the event loop that owns all state mutation
//! - `render.rs` - dirty-region rendering of feeds, posts and form feedback

mod input;
mod loop_runner;
mod render;

pub use input::{handle_command, parse_command};
pub use loop_runner::{run, Action};
pub use render::{Renderer, Tone};

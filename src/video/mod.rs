//! Title-card video composition through ffmpeg
//!
//! - [`overlay`] builds the `drawtext` filter chain
//! - [`runner`] spawns the encoder and captures its output
//! - [`compositor`] drives the render and mux passes

pub mod compositor;
pub mod overlay;
pub mod runner;

pub use compositor::{Compositor, CompositorConfig};
pub use overlay::{escape_text, DrawText, TextStyle};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};

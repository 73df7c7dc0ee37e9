pub mod circular;
pub mod config;
pub mod sequence_window;

pub use circular::SequenceSpace;
pub use config::WindowConfig;
pub use sequence_window::{SequenceWindow, WindowBounds};

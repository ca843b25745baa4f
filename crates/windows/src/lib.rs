//! Desktop window layout: position, size, stacking order and
//! minimize/maximize state of every open application window.

pub mod manager;
pub mod window;

pub use manager::{WindowError, WindowManager};
pub use window::{OSWindow, WindowState, MIN_HEIGHT, MIN_WIDTH};

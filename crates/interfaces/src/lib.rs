pub mod memory;
pub mod terminal;
pub mod traits;

pub use memory::MemoryInterface;
pub use terminal::TerminalInterface;
pub use traits::Interface;

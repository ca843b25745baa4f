//! In-memory hierarchical filesystem the agent treats as its disk.

pub mod error;
pub mod fs;
pub mod node;
pub mod path;

pub use error::VfsError;
pub use fs::VirtualFileSystem;
pub use node::{FileNode, FileStat, NodeType};

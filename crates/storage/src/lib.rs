pub mod store;
pub mod ui_state;

pub use store::{load_or_default, save, FileStore, KeyValueStore, MemoryStore, StorageError};
pub use ui_state::{keys, DesktopIcon, MainView, UiState, Widget, WidgetType};

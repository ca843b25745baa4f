//! Chat-completion providers with function calling.

pub mod gemini;
pub mod scripted;
pub mod traits;
pub mod types;

pub use gemini::GeminiProvider;
pub use scripted::{OfflineProvider, ScriptedProvider};
pub use traits::{ChatProvider, ChatSession, ProviderError};
pub use types::{Content, FunctionCall, FunctionResponse, ModelResponse, Part, Role, ToolDeclaration};

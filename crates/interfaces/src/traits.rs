use async_trait::async_trait;

/// Where the REPL reads lines from and writes replies to.
#[async_trait]
pub trait Interface: Send + Sync {
    /// Next input line, trimmed. `None` at end of input.
    async fn receive_input(&self) -> Option<String>;
    async fn send_output(&self, message: &str);
    async fn show_status(&self, status: &str);
    async fn show_error(&self, error: &str);
}

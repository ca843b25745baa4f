use crate::traits::Interface;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Feeds canned input lines and records everything written back.
#[derive(Default)]
pub struct MemoryInterface {
    input: Mutex<VecDeque<String>>,
    output: Mutex<Vec<String>>,
}

impl MemoryInterface {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Mutex::new(lines.into_iter().map(Into::into).collect()),
            output: Mutex::new(Vec::new()),
        }
    }

    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }
}

#[async_trait]
impl Interface for MemoryInterface {
    async fn receive_input(&self) -> Option<String> {
        self.input.lock().pop_front().map(|line| line.trim().to_string())
    }

    async fn send_output(&self, message: &str) {
        self.output.lock().push(message.to_string());
    }

    async fn show_status(&self, status: &str) {
        self.output.lock().push(format!("status: {}", status));
    }

    async fn show_error(&self, error: &str) {
        self.output.lock().push(format!("error: {}", error));
    }
}

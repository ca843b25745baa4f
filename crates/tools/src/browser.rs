use crate::traits::{str_arg, Tool, ToolContext, ToolError};
use aussie_os_events::{EventBus, SystemEvent};
use aussie_os_policy::Capability;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const EMPTY_PAGE: &str = "<html><body><h1>No content available</h1></body></html>";

/// The agent's web browser.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<String, ToolError>;
    async fn click(&self, selector: &str) -> Result<String, ToolError>;
    /// HTML of the current page.
    async fn scrape(&self) -> Result<String, ToolError>;
    async fn screenshot(&self) -> Result<String, ToolError>;
}

#[derive(Default)]
struct Page {
    url: Option<String>,
    content: String,
}

/// Browser that only records intent: every action is published on the bus
/// for whatever renders the page, and the page body is whatever the renderer
/// last reported through [`SimulatedBrowser::set_page_content`].
pub struct SimulatedBrowser {
    bus: EventBus,
    page: Mutex<Page>,
}

impl SimulatedBrowser {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            page: Mutex::new(Page::default()),
        }
    }

    pub fn set_page_content(&self, content: &str) {
        self.page.lock().content = content.to_string();
    }

    pub fn current_url(&self) -> Option<String> {
        self.page.lock().url.clone()
    }
}

#[async_trait]
impl Browser for SimulatedBrowser {
    async fn navigate(&self, url: &str) -> Result<String, ToolError> {
        let parsed = Url::parse(url)
            .map_err(|e| ToolError::Validation(format!("invalid URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::Validation(format!(
                "unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        {
            let mut page = self.page.lock();
            page.url = Some(parsed.to_string());
            page.content = format!(
                "<html><head><title>{}</title></head><body></body></html>",
                parsed.host_str().unwrap_or_default()
            );
        }
        debug!("Browser navigating to {}", parsed);
        self.bus.emit(SystemEvent::BrowserNavigate {
            url: parsed.to_string(),
        });
        Ok(format!("Navigated to {}", parsed))
    }

    async fn click(&self, selector: &str) -> Result<String, ToolError> {
        if self.page.lock().url.is_none() {
            return Err(ToolError::Execution("No page is open".to_string()));
        }
        self.bus.emit(SystemEvent::BrowserAction {
            action: "click".to_string(),
            selector: Some(selector.to_string()),
        });
        Ok(format!("Click action sent for: {}", selector))
    }

    async fn scrape(&self) -> Result<String, ToolError> {
        let page = self.page.lock();
        if page.content.is_empty() {
            Ok(EMPTY_PAGE.to_string())
        } else {
            Ok(page.content.clone())
        }
    }

    async fn screenshot(&self) -> Result<String, ToolError> {
        let url = self
            .current_url()
            .ok_or_else(|| ToolError::Execution("No page is open".to_string()))?;
        self.bus.emit(SystemEvent::BrowserAction {
            action: "screenshot".to_string(),
            selector: None,
        });
        Ok(format!("Screenshot requested for {} (1280x720)", url))
    }
}

pub struct BrowserNavigateTool {
    browser: Arc<dyn Browser>,
}

impl BrowserNavigateTool {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for BrowserNavigateTool {
    fn name(&self) -> &str {
        "browser_navigate"
    }

    fn description(&self) -> &str {
        "Navigate the internal browser."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Absolute http(s) URL" }
            },
            "required": ["url"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let result = self.browser.navigate(str_arg(&args, "url")?).await?;
        Ok(json!({ "result": result }))
    }
}

pub struct BrowserClickTool {
    browser: Arc<dyn Browser>,
}

impl BrowserClickTool {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for BrowserClickTool {
    fn name(&self) -> &str {
        "browser_click"
    }

    fn description(&self) -> &str {
        "Click an element in the browser."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "selector": { "type": "string", "description": "CSS selector" }
            },
            "required": ["selector"]
        })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, args: Value) -> Result<Value, ToolError> {
        let result = self.browser.click(str_arg(&args, "selector")?).await?;
        Ok(json!({ "result": result }))
    }
}

pub struct BrowserScrapeTool {
    browser: Arc<dyn Browser>,
}

impl BrowserScrapeTool {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for BrowserScrapeTool {
    fn name(&self) -> &str {
        "browser_scrape"
    }

    fn description(&self) -> &str {
        "Get text content of browser page."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, _args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "content": self.browser.scrape().await? }))
    }
}

pub struct BrowserScreenshotTool {
    browser: Arc<dyn Browser>,
}

impl BrowserScreenshotTool {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Tool for BrowserScreenshotTool {
    fn name(&self) -> &str {
        "browser_screenshot"
    }

    fn description(&self) -> &str {
        "Take a screenshot of the browser."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    fn capability(&self) -> Capability {
        Capability::Network
    }

    async fn execute(&self, _ctx: &mut ToolContext, _args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "result": self.browser.screenshot().await? }))
    }
}

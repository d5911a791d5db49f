//! In-memory fakes for the bridge traits (testing only)
//!
//! Provides `ScriptedBrowser` and `ScriptedDesignTool`, which serve canned
//! pages, screenshots and design variables without any external service.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::bridge::*;
use crate::domain::Viewport;
use crate::error::{Result, ReviewError};

// ---------------------------------------------------------------------------
// ScriptedBrowser
// ---------------------------------------------------------------------------

/// Canned content for one URL.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub html: String,
    pub text: String,
    pub console: Vec<ConsoleMessage>,
    pub metrics: PerformanceMetrics,
    pub selector_html: HashMap<String, String>,
    pub selector_screenshots: HashMap<String, ImageHandle>,

    /// Full-page screenshot keyed by viewport width.
    pub screenshots_by_width: HashMap<u32, ImageHandle>,
    pub navigate_error: Option<String>,
}

impl ScriptedPage {
    pub fn new(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_console_error(mut self, text: impl Into<String>) -> Self {
        self.console.push(ConsoleMessage {
            level: ConsoleLevel::Error,
            text: text.into(),
        });
        self
    }

    pub fn with_metrics(mut self, metrics: PerformanceMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_selector_html(mut self, selector: impl Into<String>, html: impl Into<String>) -> Self {
        self.selector_html.insert(selector.into(), html.into());
        self
    }

    pub fn with_selector_screenshot(mut self, selector: impl Into<String>, image: ImageHandle) -> Self {
        self.selector_screenshots.insert(selector.into(), image);
        self
    }

    pub fn failing_navigation(mut self, reason: impl Into<String>) -> Self {
        self.navigate_error = Some(reason.into());
        self
    }
}

#[derive(Debug, Default)]
struct BrowserState {
    current: Option<(String, Viewport)>,
    navigations: Vec<(String, Viewport)>,
    closed: bool,
}

/// In-memory browser serving `ScriptedPage`s by URL.
///
/// Unknown URLs fall back to the default page. Unless scripted otherwise,
/// full-page screenshots are exactly as wide as the viewport.
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    default_page: ScriptedPage,
    pages: HashMap<String, ScriptedPage>,
    state: Mutex<BrowserState>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.default_page.html = html.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.default_page.text = text.into();
        self
    }

    pub fn with_metrics(mut self, metrics: PerformanceMetrics) -> Self {
        self.default_page.metrics = metrics;
        self
    }

    pub fn with_screenshot_for_width(mut self, width: u32, image: ImageHandle) -> Self {
        self.default_page.screenshots_by_width.insert(width, image);
        self
    }

    pub fn failing_navigation(mut self, reason: impl Into<String>) -> Self {
        self.default_page.navigate_error = Some(reason.into());
        self
    }

    pub fn with_page(mut self, url: impl Into<String>, page: ScriptedPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    /// Every navigation performed, in order.
    pub fn navigations(&self) -> Vec<(String, Viewport)> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn page(&self, url: &str) -> &ScriptedPage {
        self.pages.get(url).unwrap_or(&self.default_page)
    }

    fn current(&self) -> Result<(String, Viewport)> {
        self.state
            .lock()
            .unwrap()
            .current
            .clone()
            .ok_or_else(|| ReviewError::Capture("no page loaded".to_string()))
    }
}

#[async_trait]
impl BrowserBridge for ScriptedBrowser {
    async fn navigate(&self, url: &str, viewport: Viewport) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push((url.to_string(), viewport));
        if let Some(reason) = &self.page(url).navigate_error {
            state.current = None;
            return Err(ReviewError::Navigation {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }
        state.current = Some((url.to_string(), viewport));
        Ok(())
    }

    async fn screenshot(&self, selector: Option<&str>, _full_page: bool) -> Result<ImageHandle> {
        let (url, viewport) = self.current()?;
        let page = self.page(&url);
        match selector {
            Some(sel) => page
                .selector_screenshots
                .get(sel)
                .cloned()
                .ok_or_else(|| ReviewError::Capture(format!("no element matches '{sel}'"))),
            None => Ok(page
                .screenshots_by_width
                .get(&viewport.width)
                .cloned()
                .unwrap_or_else(|| {
                    ImageHandle::solid(viewport.width, viewport.height, [255, 255, 255, 255])
                })),
        }
    }

    async fn visible_html(&self, selector: Option<&str>) -> Result<String> {
        let (url, _) = self.current()?;
        let page = self.page(&url);
        match selector {
            Some(sel) => page
                .selector_html
                .get(sel)
                .cloned()
                .ok_or_else(|| ReviewError::Capture(format!("no element matches '{sel}'"))),
            None => Ok(page.html.clone()),
        }
    }

    async fn visible_text(&self) -> Result<String> {
        let (url, _) = self.current()?;
        Ok(self.page(&url).text.clone())
    }

    async fn console_logs(&self, filter: Option<ConsoleLevel>) -> Result<Vec<ConsoleMessage>> {
        let (url, _) = self.current()?;
        Ok(self
            .page(&url)
            .console
            .iter()
            .filter(|m| filter.map_or(true, |level| m.level == level))
            .cloned()
            .collect())
    }

    async fn performance_metrics(&self) -> Result<PerformanceMetrics> {
        let (url, _) = self.current()?;
        Ok(self.page(&url).metrics)
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.current = None;
        state.closed = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedDesignTool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ScriptedNode {
    variables: VariableDefs,
    image: Option<ImageHandle>,
    code: String,
}

/// In-memory design tool keyed by node id.
#[derive(Debug, Default)]
pub struct ScriptedDesignTool {
    nodes: HashMap<String, ScriptedNode>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDesignTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(
        mut self,
        node_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.nodes
            .entry(node_id.into())
            .or_default()
            .variables
            .insert(name.into(), value.into());
        self
    }

    pub fn with_image(mut self, node_id: impl Into<String>, image: ImageHandle) -> Self {
        self.nodes.entry(node_id.into()).or_default().image = Some(image);
        self
    }

    pub fn with_code(mut self, node_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.nodes.entry(node_id.into()).or_default().code = code.into();
        self
    }

    /// Tool calls received, as `"<tool>:<node>"`, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn node(&self, tool: &str, node_id: &str) -> Result<&ScriptedNode> {
        self.calls.lock().unwrap().push(format!("{tool}:{node_id}"));
        self.nodes
            .get(node_id)
            .ok_or_else(|| ReviewError::DesignTool(format!("unknown node {node_id}")))
    }
}

#[async_trait]
impl DesignToolBridge for ScriptedDesignTool {
    async fn variable_defs(&self, node_id: &str) -> Result<VariableDefs> {
        Ok(self.node("get_variable_defs", node_id)?.variables.clone())
    }

    async fn image(&self, node_id: &str) -> Result<ImageHandle> {
        self.node("get_image", node_id)?
            .image
            .clone()
            .ok_or_else(|| ReviewError::DesignTool(format!("node {node_id} has no image")))
    }

    async fn code(&self, node_id: &str) -> Result<String> {
        Ok(self.node("get_code", node_id)?.code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_browser_serves_page_by_url() {
        let browser = ScriptedBrowser::new()
            .with_html("<p>default</p>")
            .with_page("https://a.test", ScriptedPage::new("<p>a</p>", "a"));

        browser.navigate("https://a.test", Viewport::MOBILE).await.expect("nav");
        assert_eq!(browser.visible_html(None).await.expect("html"), "<p>a</p>");

        browser.navigate("https://other.test", Viewport::MOBILE).await.expect("nav");
        assert_eq!(browser.visible_html(None).await.expect("html"), "<p>default</p>");
        let shot = browser.screenshot(None, true).await.expect("shot");
        assert_eq!(shot.width, 375);
    }

    #[tokio::test]
    async fn test_browser_requires_navigation() {
        let browser = ScriptedBrowser::new();
        assert!(browser.visible_text().await.is_err());
    }

    #[tokio::test]
    async fn test_browser_console_filter() {
        let browser = ScriptedBrowser::new().with_page(
            "https://a.test",
            ScriptedPage::new("", "").with_console_error("boom"),
        );
        browser.navigate("https://a.test", Viewport::DESKTOP).await.expect("nav");
        assert_eq!(browser.console_logs(Some(ConsoleLevel::Error)).await.expect("logs").len(), 1);
        assert!(browser.console_logs(Some(ConsoleLevel::Info)).await.expect("logs").is_empty());
    }

    #[tokio::test]
    async fn test_browser_close() {
        let browser = ScriptedBrowser::new();
        browser.close().await.expect("close");
        assert!(browser.is_closed());
    }

    #[tokio::test]
    async fn test_design_tool_records_calls() {
        let tool = ScriptedDesignTool::new().with_variable("1:2", "color/primary", "#0055ff");
        let vars = tool.variable_defs("1:2").await.expect("vars");
        assert_eq!(vars.get("color/primary").map(String::as_str), Some("#0055ff"));
        assert!(tool.image("1:2").await.is_err());
        assert!(tool.code("9:9").await.is_err());
        assert_eq!(tool.calls(), vec!["get_variable_defs:1:2", "get_image:1:2", "get_code:9:9"]);
    }
}

//! HTTP bridges to MCP-style tool servers.
//!
//! Both bridges speak the same minimal protocol: `POST {base}/tools/call`
//! with `{"name": <tool>, "arguments": {...}}`, answered by either
//! `{"result": ...}` or `{"error": ...}`. Screenshots and node renders come
//! back as base64 PNG or JPEG, either bare, as a `data:` URL, or as MCP image
//! content (`{"type": "image", "data", "mimeType"}`).

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::bridge::{
    BrowserBridge, ConsoleLevel, ConsoleMessage, DesignToolBridge, ImageHandle,
    PerformanceMetrics, VariableDefs,
};
use crate::domain::Viewport;
use crate::error::{Result, ReviewError};

const DEFAULT_BROWSER_URL: &str = "http://127.0.0.1:3100";
const DEFAULT_DESIGN_URL: &str = "http://127.0.0.1:3845";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Reads LCP, FID and CLS from the buffered performance entries.
const WEB_VITALS_SCRIPT: &str = r#"(() => {
  const last = (type) => performance.getEntriesByType(type).slice(-1)[0];
  const lcp = last('largest-contentful-paint');
  const fid = last('first-input');
  const cls = performance.getEntriesByType('layout-shift')
    .filter((e) => !e.hadRecentInput)
    .reduce((sum, e) => sum + e.value, 0);
  return {
    lcp_ms: lcp ? lcp.startTime : 0,
    fid_ms: fid ? fid.processingStart - fid.startTime : 0,
    cls,
  };
})()"#;

/// Endpoints and credentials for the tool servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub browser_url: String,
    pub design_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            browser_url: std::env::var("DESIGN_REVIEW_BROWSER_URL")
                .unwrap_or_else(|_| DEFAULT_BROWSER_URL.to_string()),
            design_url: std::env::var("DESIGN_REVIEW_DESIGN_URL")
                .unwrap_or_else(|_| DEFAULT_DESIGN_URL.to_string()),
            token: std::env::var("DESIGN_REVIEW_BRIDGE_TOKEN").ok(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BridgeConfig {
    /// Config from `DESIGN_REVIEW_*` environment variables, falling back to
    /// local defaults.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn new(browser_url: &str, design_url: &str) -> Self {
        BridgeConfig {
            browser_url: browser_url.to_string(),
            design_url: design_url.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Decode an image tool result.
pub fn decode_image(tool: &str, value: &Value) -> Result<ImageHandle> {
    let data = image_data(value)
        .ok_or_else(|| ReviewError::bridge(tool, "result carries no image data"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| ReviewError::bridge(tool, format!("invalid base64 image: {e}")))?;
    ImageHandle::decode(&bytes).map_err(|e| ReviewError::bridge(tool, e.to_string()))
}

/// Base64 payload of the first image found in `value`.
fn image_data(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.split_once("base64,").map_or(s.as_str(), |(_, data)| data)),
        Value::Object(map) => match map.get("data") {
            Some(Value::String(data)) => Some(data),
            _ => map.get("content").and_then(image_data),
        },
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .find_map(image_data),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ToolResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Extract the result of a tool response body.
fn parse_response(tool: &str, body: Value) -> Result<Value> {
    let response: ToolResponse = serde_json::from_value(body)
        .map_err(|e| ReviewError::bridge(tool, format!("malformed response: {e}")))?;
    if let Some(error) = response.error {
        let reason = match error {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(ReviewError::bridge(tool, reason));
    }
    Ok(response.result.unwrap_or(Value::Null))
}

fn as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON-over-HTTP client for one tool server.
#[derive(Debug, Clone)]
pub struct McpToolClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl McpToolClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("design-review/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke `tool` and return its result value.
    pub async fn call(&self, tool: &str, arguments: Value) -> Result<Value> {
        debug!(tool = %tool, base_url = %self.base_url, "calling tool");
        let mut request = self
            .http
            .post(format!("{}/tools/call", self.base_url))
            .json(&json!({ "name": tool, "arguments": arguments }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReviewError::bridge(tool, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReviewError::bridge(tool, format!("HTTP {status}")));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ReviewError::bridge(tool, e.to_string()))?;
        parse_response(tool, body)
    }

    async fn call_image(&self, tool: &str, arguments: Value) -> Result<ImageHandle> {
        let value = self.call(tool, arguments).await?;
        decode_image(tool, &value)
    }
}

/// Browser automation over a Playwright MCP server.
#[derive(Debug, Clone)]
pub struct McpBrowserBridge {
    client: McpToolClient,
}

impl McpBrowserBridge {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = McpToolClient::new(
            &config.browser_url,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserBridge for McpBrowserBridge {
    async fn navigate(&self, url: &str, viewport: Viewport) -> Result<()> {
        self.client
            .call(
                "playwright_navigate",
                json!({ "url": url, "width": viewport.width, "height": viewport.height }),
            )
            .await
            .map_err(|e| ReviewError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn screenshot(&self, selector: Option<&str>, full_page: bool) -> Result<ImageHandle> {
        self.client
            .call_image(
                "playwright_screenshot",
                json!({ "selector": selector, "fullPage": full_page }),
            )
            .await
    }

    async fn visible_html(&self, selector: Option<&str>) -> Result<String> {
        let value = self
            .client
            .call("playwright_get_visible_html", json!({ "selector": selector }))
            .await?;
        Ok(as_text(value))
    }

    async fn visible_text(&self) -> Result<String> {
        let value = self
            .client
            .call("playwright_get_visible_text", json!({}))
            .await?;
        Ok(as_text(value))
    }

    async fn console_logs(&self, filter: Option<ConsoleLevel>) -> Result<Vec<ConsoleMessage>> {
        const TOOL: &str = "playwright_console_logs";
        let level = match filter {
            Some(level) => serde_json::to_value(level)?,
            None => json!("all"),
        };
        let value = self.client.call(TOOL, json!({ "type": level })).await?;
        serde_json::from_value(value)
            .map_err(|e| ReviewError::bridge(TOOL, format!("malformed console logs: {e}")))
    }

    async fn performance_metrics(&self) -> Result<PerformanceMetrics> {
        const TOOL: &str = "playwright_evaluate";
        let value = self
            .client
            .call(TOOL, json!({ "script": WEB_VITALS_SCRIPT }))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| ReviewError::bridge(TOOL, format!("malformed metrics: {e}")))
    }

    async fn close(&self) -> Result<()> {
        self.client.call("playwright_close", json!({})).await?;
        Ok(())
    }
}

/// Design variables, code and renders over a Figma dev-mode MCP server.
#[derive(Debug, Clone)]
pub struct McpDesignToolBridge {
    client: McpToolClient,
}

impl McpDesignToolBridge {
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let client = McpToolClient::new(
            &config.design_url,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DesignToolBridge for McpDesignToolBridge {
    async fn variable_defs(&self, node_id: &str) -> Result<VariableDefs> {
        const TOOL: &str = "get_variable_defs";
        let value = self.client.call(TOOL, json!({ "nodeId": node_id })).await?;
        let raw: std::collections::BTreeMap<String, Value> = serde_json::from_value(value)
            .map_err(|e| ReviewError::DesignTool(format!("{TOOL}: malformed variables: {e}")))?;
        Ok(raw.into_iter().map(|(k, v)| (k, as_text(v))).collect())
    }

    async fn image(&self, node_id: &str) -> Result<ImageHandle> {
        self.client
            .call_image("get_image", json!({ "nodeId": node_id }))
            .await
    }

    async fn code(&self, node_id: &str) -> Result<String> {
        let value = self.client.call("get_code", json!({ "nodeId": node_id })).await?;
        Ok(as_text(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = BridgeConfig::new("http://browser:3100", "http://figma:3845")
            .with_token("secret")
            .with_timeout(5);
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_parse_response_result_and_error() {
        let ok = parse_response("t", json!({ "result": "<p>hi</p>" })).expect("result");
        assert_eq!(ok, json!("<p>hi</p>"));

        let err = parse_response("t", json!({ "error": "no such element" })).expect_err("error");
        assert!(err.to_string().contains("no such element"));

        let empty = parse_response("t", json!({})).expect("null");
        assert!(empty.is_null());
    }

    /// 2x1 RGBA PNG: one brand-blue pixel, one white pixel.
    const TWO_PIXEL_PNG: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAIAAAABCAYAAAD0In+KAAAADUlEQVR4nGNgCP0PBgAXRwZQqYnooQAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_base64_png_screenshot() {
        let image = decode_image("playwright_screenshot", &json!(TWO_PIXEL_PNG)).expect("decode");
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixel(0, 0), Some([0, 85, 255, 255]));
        assert_eq!(image.pixel(1, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_decode_image_content_shapes() {
        let data_url = json!(format!("data:image/png;base64,{TWO_PIXEL_PNG}"));
        let content = json!({ "data": TWO_PIXEL_PNG, "mimeType": "image/png" });
        let tool_result = json!({
            "content": [
                { "type": "text", "text": "Screenshot taken" },
                { "type": "image", "data": TWO_PIXEL_PNG, "mimeType": "image/png" }
            ]
        });
        for value in [data_url, content, tool_result] {
            let image = decode_image("get_image", &value).expect("decode");
            assert_eq!(image.width, 2);
        }
    }

    #[test]
    fn test_decode_jpeg_round_trip() {
        let grey = ImageHandle::solid(8, 8, [200, 200, 200, 255]);
        let rgb = image::DynamicImage::ImageRgba8(grey.to_rgba_image().expect("view")).into_rgb8();
        let mut jpeg = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .expect("jpeg");
        let encoded = base64::engine::general_purpose::STANDARD.encode(jpeg.into_inner());
        let decoded = decode_image("get_image", &json!({ "data": encoded, "mimeType": "image/jpeg" }))
            .expect("decode");
        assert_eq!((decoded.width, decoded.height), (8, 8));
    }

    #[test]
    fn test_decode_image_rejects_non_images() {
        for value in [json!({ "width": 2 }), json!("%%%"), json!(Value::Null)] {
            assert!(matches!(
                decode_image("get_image", &value),
                Err(ReviewError::Bridge { .. })
            ));
        }
    }

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(json!("#fff")), "#fff");
        assert_eq!(as_text(json!(16)), "16");
        assert_eq!(as_text(Value::Null), "");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_bridge_error() {
        let config = BridgeConfig::new("http://127.0.0.1:9", "http://127.0.0.1:9").with_timeout(2);
        let bridge = McpDesignToolBridge::new(&config).expect("client");
        let err = bridge.code("1:2").await.expect_err("unreachable");
        assert!(matches!(err, ReviewError::Bridge { ref tool, .. } if tool == "get_code"));
    }
}

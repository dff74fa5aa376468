//! MCP (Model Context Protocol) server implementation

use scrapeflow::{SummarizeRequest, Tool, TOOL_DESCRIPTION, TOOL_NAME};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error};

/// JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server implementation
struct McpServer {
    tool: Tool,
}

impl McpServer {
    fn new(tool: Tool) -> Self {
        Self { tool }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "ScrapeFlow",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "tools": [{
                    "name": TOOL_NAME,
                    "description": TOOL_DESCRIPTION,
                    "inputSchema": self.tool.input_schema()
                }]
            }),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        if tool_name != TOOL_NAME {
            return JsonRpcResponse::error(id, -32602, format!("Unknown tool: {}", tool_name));
        }

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        // Parse request
        let request: SummarizeRequest = match serde_json::from_value(arguments) {
            Ok(req) => req,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid arguments: {}", e));
            }
        };

        let url = request.url.clone();
        let (text, is_error) = match self.tool.execute(request).await {
            Ok(response) => (response.render(), false),
            Err(e) => {
                debug!(kind = ?e.kind(), "Tool call failed");
                (e.render(&url), true)
            }
        };

        let mut result = json!({
            "content": [{
                "type": "text",
                "text": text
            }]
        });
        if is_error {
            result["isError"] = json!(true);
        }

        JsonRpcResponse::success(id, result)
    }
}

/// Run the MCP server over stdio
pub async fn run_server(tool: Tool) {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    if let Err(e) = serve(McpServer::new(tool), stdin, stdout).await {
        error!("MCP transport error: {}", e);
    }
}

/// Serve line-delimited JSON-RPC until the reader is exhausted
async fn serve<R, W>(server: McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response = JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e));
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        // Notifications get no response
        if request.id.is_none() && request.method.starts_with("notifications/") {
            debug!(method = %request.method, "Notification received");
            continue;
        }

        let response = server.handle_request(request).await;
        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response).unwrap_or_default();
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scrapeflow::{BrowserLauncher, BrowserSession, LaunchOptions, ScrapeError};
    use std::sync::Arc;
    use std::time::Duration;

    struct StaticPage(&'static str);

    #[async_trait]
    impl BrowserLauncher for StaticPage {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn launch(
            &self,
            _options: &LaunchOptions,
        ) -> Result<Box<dyn BrowserSession>, ScrapeError> {
            Ok(Box::new(StaticSession(self.0)))
        }
    }

    struct StaticSession(&'static str);

    #[async_trait]
    impl BrowserSession for StaticSession {
        async fn navigate(&mut self, _url: &str) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn content(&mut self) -> Result<String, ScrapeError> {
            Ok(self.0.to_string())
        }

        async fn close(self: Box<Self>) -> Result<(), ScrapeError> {
            Ok(())
        }
    }

    fn server() -> McpServer {
        let tool = Tool::builder()
            .launcher(Arc::new(StaticPage(
                "<html><body><nav>menu</nav><main>Page body</main></body></html>",
            )))
            .settle_delay(Duration::ZERO)
            .build();
        McpServer::new(tool)
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server().handle_request(request("initialize", json!({}))).await;
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "ScrapeFlow");
        assert_eq!(result["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = server().handle_request(request("tools/list", json!({}))).await;
        let result = response.result.unwrap();
        let tool = &result["tools"][0];

        assert_eq!(tool["name"], "search_and_summarize");
        assert!(tool["inputSchema"]["properties"]["url"].is_object());
        assert!(tool["inputSchema"]["properties"]["max_chars"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let response = server()
            .handle_request(request(
                "tools/call",
                json!({
                    "name": "search_and_summarize",
                    "arguments": {"url": "https://example.com", "include_metadata": false}
                }),
            ))
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "Page body");
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_invalid_scheme() {
        let response = server()
            .handle_request(request(
                "tools/call",
                json!({
                    "name": "search_and_summarize",
                    "arguments": {"url": "ftp://example.com"}
                }),
            ))
            .await;

        let result = response.result.unwrap();
        assert_eq!(
            result["content"][0]["text"],
            "Invalid URL: must start with http:// or https://"
        );
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let response = server()
            .handle_request(request("tools/call", json!({"name": "other"})))
            .await;

        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tools_call_missing_url() {
        let response = server()
            .handle_request(request(
                "tools/call",
                json!({"name": "search_and_summarize", "arguments": {}}),
            ))
            .await;

        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.starts_with("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server().handle_request(request("resources/list", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_serve_over_lines() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        );
        let mut output = Vec::new();

        serve(server(), input.as_bytes(), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        let responses: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
    }
}

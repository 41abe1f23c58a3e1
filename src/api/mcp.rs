//! Model Context Protocol (MCP) server implementation for Fizzy
//!
//! This module binds the [`ToolRouter`] to the MCP runtime: discovery returns
//! the tool catalog and every invocation is handed to the router, which always
//! answers with a result envelope rather than a protocol error.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer, ServerHandler,
};

use super::router::{ToolResponse, ToolRouter};

/// MCP server implementation for Fizzy
///
/// Cloning is cheap; all clones share one router and its client cache.
#[derive(Clone)]
pub struct FizzyMcpServer {
    router: Arc<ToolRouter>,
}

impl FizzyMcpServer {
    pub fn new(router: ToolRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }

    /// Tool catalog in MCP form
    pub fn tools(&self) -> Vec<Tool> {
        self.router
            .catalog()
            .into_iter()
            .map(|tool| Tool::new(tool.name, tool.description, Arc::new(tool.input_schema)))
            .collect()
    }

    pub async fn call(&self, name: &str, arguments: Option<rmcp::model::JsonObject>) -> CallToolResult {
        self.router.invoke(name, arguments).await.into()
    }
}

impl From<ToolResponse> for CallToolResult {
    fn from(response: ToolResponse) -> Self {
        let content = vec![Content::text(response.text)];
        if response.is_error {
            CallToolResult::error(content)
        } else {
            // Successful envelopes carry no isError flag at all.
            let mut result = CallToolResult::success(content);
            result.is_error = None;
            result
        }
    }
}

// Implement ServerHandler for the MCP server
impl ServerHandler for FizzyMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "fizzy-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Fizzy MCP Server - boards, cards and steps on Fizzy.do.\n\
                 Cards are addressed by their number. Use fizzy_sync_todos to mirror a todo \
                 list onto a new card; steps keep the order of the list."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::ClientCache;
    use crate::config::{CredentialSource, Credentials};

    struct NoCredentials;

    impl CredentialSource for NoCredentials {
        fn resolve(&self) -> Credentials {
            Credentials::unconfigured()
        }
    }

    fn server() -> FizzyMcpServer {
        FizzyMcpServer::new(ToolRouter::new(Arc::new(NoCredentials), ClientCache::http()))
    }

    #[test]
    fn test_tools_carry_schemas() {
        let tools = server().tools();
        assert_eq!(tools.len(), 9);

        let create_card = tools
            .iter()
            .find(|tool| tool.name == "fizzy_create_card")
            .unwrap();
        assert_eq!(
            create_card.input_schema["required"],
            serde_json::json!(["board_id", "title"])
        );
    }

    #[test]
    fn test_error_response_sets_is_error() {
        let result: CallToolResult = ToolResponse::error("Access denied").into();
        assert_eq!(result.is_error, Some(true));

        let result: CallToolResult = ToolResponse::text("ok").into();
        assert_eq!(result.is_error, None);
        let envelope = serde_json::to_value(&result).unwrap();
        assert!(envelope.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_call_without_credentials() {
        let result = server().call("fizzy_list_boards", None).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn test_server_info_enables_tools() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "fizzy-mcp-server");
    }
}

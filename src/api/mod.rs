//! API module
//!
//! This module provides the Fizzy API client, the tool router that maps tool
//! calls onto it, and the MCP server that exposes the router.

pub mod cache;
pub mod client;
pub mod error;
pub mod mcp;
pub mod pipeline;
pub mod router;
pub mod tools;

// Re-export commonly used types
pub use cache::ClientCache;
pub use client::{ClientConfig, ClientError, FizzyApi, HttpClient};
pub use error::ToolError;
pub use mcp::FizzyMcpServer;
pub use router::{ToolResponse, ToolRouter};

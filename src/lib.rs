//! Fizzy MCP library crate
//!
//! Exposes the Fizzy.do project-management API (boards, cards, steps) as MCP
//! tools. The [`api::client`] module wraps the REST API, [`api::router`] turns
//! tool calls into client operations, and [`api::mcp`] serves them over stdio.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod schema;

pub use api::{ClientCache, FizzyMcpServer, ToolRouter};
pub use config::{ConfigResolver, CredentialSource, Credentials};

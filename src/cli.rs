//! CLI module
//!
//! This module provides the command-line interface for the fizzy-mcp binary:
//! serving MCP over stdio plus a few helpers for setup and debugging.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use rmcp::ServiceExt;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{
        client::ensure_secure_url, router::catalog, ClientCache, ClientConfig, FizzyApi,
        FizzyMcpServer, HttpClient, ToolRouter,
    },
    config::{self, ConfigFile, ConfigResolver, CredentialSource},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding config.json / .env (defaults to ~/.claude/plugins/fizzy)
    #[arg(long, global = true, env = config::CONFIG_DIR_ENV)]
    config_dir: Option<PathBuf>,

    /// Log at debug level (logs go to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Print the tool catalog as JSON
    Tools,

    /// Invoke a single tool and print its response envelope
    Call {
        /// Tool name, e.g. fizzy_list_boards
        tool: String,

        /// Arguments as a JSON object
        arguments: Option<String>,
    },

    /// Show where credentials are resolved from
    Config,

    /// Store an API token in config.json
    Setup {
        /// Fizzy API token
        #[arg(long)]
        token: String,

        /// API base URL (defaults to https://app.fizzy.do)
        #[arg(long)]
        url: Option<String>,
    },

    /// Resolve the account the current token belongs to
    Whoami,
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolver = ConfigResolver::from_process(cli.config_dir.clone());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            tracing::info!("Starting Fizzy MCP server on stdio");
            let router = ToolRouter::new(Arc::new(resolver), ClientCache::http());
            let service = FizzyMcpServer::new(router)
                .serve(rmcp::transport::stdio())
                .await
                .inspect_err(|e| tracing::error!("MCP server error: {}", e))?;
            service.waiting().await?;
            Ok(())
        }

        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&catalog())?);
            Ok(())
        }

        Commands::Call { tool, arguments } => {
            let arguments = parse_arguments(arguments.as_deref())?;
            let router = ToolRouter::new(Arc::new(resolver), ClientCache::http());
            let response = router.invoke(&tool, arguments).await;
            println!("{}", serde_json::to_string_pretty(&response.to_envelope())?);
            if response.is_error {
                return Err(format!("{} reported an error", tool).into());
            }
            Ok(())
        }

        Commands::Config => {
            let credentials = resolver.resolve();
            match resolver.config_dir() {
                Some(dir) => println!("Config directory: {}", dir.display()),
                None => println!("Config directory: {}", "unavailable".yellow()),
            }
            match credentials.masked_token() {
                Some(token) => println!(
                    "Token: {} (from {})",
                    token.green(),
                    credentials.origin
                ),
                None => println!("Token: {}", "not configured".red()),
            }
            println!("URL: {}", credentials.url);
            if credentials.dev_mode {
                println!("{}", "Development mode: insecure URLs allowed".yellow());
            }
            Ok(())
        }

        Commands::Setup { token, url } => {
            if let Some(url) = &url {
                ensure_secure_url(url, false)?;
            }
            let dir = resolver
                .config_dir()
                .ok_or("No config directory available; pass --config-dir")?;
            let path = config::write_config_file(
                dir,
                &ConfigFile {
                    token: Some(token),
                    url,
                },
            )?;
            println!("Saved Fizzy credentials to {}", path.display());
            Ok(())
        }

        Commands::Whoami => {
            let credentials = resolver.resolve();
            let config = ClientConfig::from_credentials(&credentials)
                .ok_or("Fizzy.do is not configured; run `fizzy-mcp setup --token <TOKEN>`")?;
            let client = HttpClient::new(config)?;
            let slug = client.account_slug().await?;
            println!("Account: {} at {}", slug.green(), credentials.url);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries the protocol
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn parse_arguments(
    raw: Option<&str>,
) -> Result<Option<serde_json::Map<String, Value>>, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err("Tool arguments must be a JSON object".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["fizzy-mcp"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_call_parses_tool_and_arguments() {
        let cli = Cli::try_parse_from([
            "fizzy-mcp",
            "call",
            "fizzy_get_card",
            r#"{"card_number": 3}"#,
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Call { tool, arguments }) => {
                assert_eq!(tool, "fizzy_get_card");
                let args = parse_arguments(arguments.as_deref()).unwrap().unwrap();
                assert_eq!(args["card_number"], 3);
            }
            _ => panic!("expected call subcommand"),
        }
    }

    #[test]
    fn test_arguments_must_be_an_object() {
        assert!(parse_arguments(Some("[1, 2]")).is_err());
        assert!(parse_arguments(None).unwrap().is_none());
    }
}

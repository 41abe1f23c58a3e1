//! Binary entrypoint for the fizzy-mcp server

#[tokio::main]
async fn main() {
    if let Err(e) = fizzy_mcp::cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

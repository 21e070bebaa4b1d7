#[tokio::main]
async fn main() {
    if let Err(err) = modusign_mcp::mcp::server::run_stdio().await {
        eprintln!("modusign-mcp: {}", err);
        if let Some(hint) = &err.hint {
            eprintln!("{}", hint);
        }
        std::process::exit(1);
    }
}

mod cli;

use env_logger::{Env, Target};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP transport, logs must stay on stderr
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    cli::run().await?;
    Ok(())
}

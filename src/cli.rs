use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use tidal_mcp::clients::api::TidalApi;
use tidal_mcp::clients::auth::{Authenticator, BrowserPrompt, LoginOutcome, LoginPrompt};
use tidal_mcp::clients::errors::{Error, Result};
use tidal_mcp::clients::tidal::models::DeviceAuthorization;
use tidal_mcp::clients::{SessionStore, TidalClient};
use tidal_mcp::config::Config;
use tidal_mcp::mcp::run_stdio_server;
use tidal_mcp::mcp::tools::TidalTools;

#[derive(Parser)]
#[command(name = "tidal-mcp")]
#[command(version, about = "MCP server for the TIDAL music streaming service", long_about = None)]
struct Cli {
    /// Session file location (defaults to the user cache directory)
    #[arg(long, global = true, value_name = "PATH")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio
    Serve,
    /// Log in to TIDAL from the terminal and store the session
    Login,
    /// Remove the stored session
    Logout,
    /// Show whether a stored session exists and is still valid
    Status,
}

/// Prints the login link for a person at the terminal, then tries the browser too
struct TerminalPrompt;

impl LoginPrompt for TerminalPrompt {
    fn show(&self, authorization: &DeviceAuthorization) -> std::io::Result<()> {
        let url = authorization.login_url();
        println!("Open {url} in your browser to log in to TIDAL.");
        println!(
            "Confirm code {} within {} seconds.",
            authorization.user_code, authorization.expires_in
        );
        if let Err(e) = webbrowser::open(&url) {
            debug!("Could not open a browser: {e}");
        }
        Ok(())
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.session_file).await,
        Commands::Login => login(cli.session_file).await,
        Commands::Logout => logout(cli.session_file).await,
        Commands::Status => status(cli.session_file).await,
    }
}

fn session_store(config: &Config) -> SessionStore {
    config
        .session_file
        .clone()
        .map_or_else(SessionStore::try_default, SessionStore::new)
}

fn load_config(session_file: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::from_env()?;
    if session_file.is_some() {
        config.session_file = session_file;
    }
    Ok(config)
}

// One client per process, shared by the login flow and every tool
fn build(config: Config, prompt: Box<dyn LoginPrompt>) -> (Arc<dyn TidalApi>, Arc<Authenticator>) {
    let store = session_store(&config);
    let timeout = config.login_timeout;
    let api: Arc<dyn TidalApi> = Arc::new(TidalClient::new(config).with_store(store.clone()));
    let auth = Arc::new(Authenticator::new(api.clone(), store, prompt, timeout));
    (api, auth)
}

async fn serve(session_file: Option<PathBuf>) -> Result<()> {
    info!("Building config ...");
    let config = load_config(session_file)?;
    let (api, auth) = build(config, Box::new(BrowserPrompt));

    // A stored session is picked up eagerly; without one the client must call `login`
    match auth.ensure_authenticated().await {
        Ok(()) => info!("Using stored TIDAL session"),
        Err(Error::NotAuthenticated) => info!("No valid TIDAL session, waiting for login tool"),
        Err(e) => warn!("Could not validate stored TIDAL session: {e}"),
    }

    run_stdio_server(TidalTools::new(api, auth)).await
}

async fn login(session_file: Option<PathBuf>) -> Result<()> {
    let config = load_config(session_file)?;
    let (_, auth) = build(config, Box::new(TerminalPrompt));
    match auth.login().await? {
        LoginOutcome::AlreadyAuthenticated => println!("Already authenticated with TIDAL."),
        LoginOutcome::LoggedIn => println!("Successfully authenticated with TIDAL."),
    }
    let status = auth.status().await;
    println!("Session stored at {}", status.session_file.display());
    Ok(())
}

// Works without credentials, only the session file is touched
async fn logout(session_file: Option<PathBuf>) -> Result<()> {
    dotenvy::dotenv().ok();
    let store = match session_file {
        Some(path) => SessionStore::new(path),
        None => match std::env::var_os("TIDAL_SESSION_FILE") {
            Some(path) => SessionStore::new(path),
            None => SessionStore::try_default(),
        },
    };
    store.clear().await?;
    println!("Removed TIDAL session {}", store.path().display());
    Ok(())
}

async fn status(session_file: Option<PathBuf>) -> Result<()> {
    let config = load_config(session_file)?;
    let (_, auth) = build(config, Box::new(TerminalPrompt));
    match auth.ensure_authenticated().await {
        Ok(()) | Err(Error::NotAuthenticated) => {}
        Err(e) => return Err(e),
    }
    let status = auth.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

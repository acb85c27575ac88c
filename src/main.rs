use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, warn};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use anyhow::anyhow;

use callbot_gateway::{
    ServerConfig,
    client::request_outbound_call,
    config::DEFAULT_PORT,
    routes,
    state::AppState,
    tunnel::resolve_for_config,
};

/// Call bot gateway - Twilio voice bot with streaming STT, an LLM agent and TTS
#[derive(Parser, Debug)]
#[command(name = "callbot-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Local port to serve on (and to tunnel when BASE_URL is unset)
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a running gateway to place an outbound call
    Call {
        /// Destination number in E.164 form, e.g. +573001112233
        #[arg(long = "to")]
        to: String,

        /// Gateway to send the request to
        #[arg(long = "server")]
        server: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
}

async fn run_call_command(to: String, server: Option<String>, yes: bool) -> anyhow::Result<()> {
    let server = server.unwrap_or_else(|| format!("http://127.0.0.1:{DEFAULT_PORT}"));

    if !yes {
        print!("Press enter to call {to} through {server}...");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
    }

    let body = request_outbound_call(&server, &to).await?;
    println!("{body}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Some(Commands::Call { to, server, yes }) = cli.command {
        return run_call_command(to, server, yes).await;
    }

    // Load configuration from file or environment
    let mut config = if let Some(config_path) = cli.config {
        println!("Loading configuration from {}", config_path.display());
        ServerConfig::from_file(&config_path)?
    } else {
        ServerConfig::from_env()?
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    // Resolve the public base URL; the tunnel lives as long as the server
    let (base_url, tunnel) = resolve_for_config(&config).await?;

    if !config.has_twilio_credentials() {
        warn!("TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN not set, calls will be rejected");
    }

    let address = config.address();
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config, base_url.clone());
    for route in app_state.config.profiles.inbound.iter().map(|p| p.url.as_str()) {
        info!("Inbound webhook: https://{}{}", base_url, route);
    }

    let app = routes::api::create_app_router(app_state.clone())?;
    let app = routes::api::with_server_layers(app, &app_state.config)?;

    // Parse socket address
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    println!("Server listening on http://{}", socket_addr);
    let listener = TcpListener::bind(&socket_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    drop(tunnel);
    Ok(())
}

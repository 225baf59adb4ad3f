//! EcoDash CLI binary entry point.

use clap::Parser;
use ecodash::cli::{AuthCommands, Cli, Commands};
use ecodash::config::ClientConfig;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = ClientConfig {
            api_base_url: url.trim_end_matches('/').to_string(),
            ..config
        };
    }

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => ecodash::cli::auth::handle_login(config, &args).await,
            AuthCommands::Status => ecodash::cli::auth::handle_status(config).await,
            AuthCommands::Logout => ecodash::cli::auth::handle_logout(config).await,
        },
        Commands::Dashboard => ecodash::cli::stats::handle_dashboard(config).await,
        Commands::Environmental(args) => {
            ecodash::cli::stats::handle_environmental(config, args.days).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

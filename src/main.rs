//! Stamp signup - plan application signed with a My Number card

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stamp_signup::{
    config::Args,
    server,
    stamp::{HttpSessionClient, SessionClient},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("stamp_signup={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Stamp signup");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Signing service: {}", args.stamp_api_url);
    info!(
        "Token: {}",
        if args.client_config().token.is_some() { "configured" } else { "none" }
    );
    info!("Public URL: {}", args.public_url.as_deref().unwrap_or("(from Host header)"));
    info!("Locale: {:?}", args.locale());
    info!("Session TTL: {}s", args.session_ttl_seconds);
    info!(
        "Callback: manual return {}, session id in query {}",
        args.require_manual_return, args.callback_with_session_id
    );
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("======================================");

    let client: Arc<dyn SessionClient> = Arc::new(HttpSessionClient::new(args.client_config()));
    let state = Arc::new(server::AppState::new(args, client)?);

    if let Err(e) = server::run(state).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

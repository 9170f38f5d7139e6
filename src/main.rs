//! Walletgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment (missing storage URL or signing
//!    secret is fatal)
//! 2. Open the nonce store
//! 3. Build the coordinator, token service, and router
//! 4. Serve until SIGINT/SIGTERM, then drain in-flight requests
//!
//! Also supports a `sign` subcommand for signing a challenge from the shell.

use chrono::TimeDelta;
use std::sync::Arc;
use std::time::Duration;
use walletgate::{
    auth::{AppState, AuthCoordinator, EvmSignatureVerifier, TokenService},
    config::Config,
    models::challenge_message,
    routes, storage,
};

/// Sign the challenge message for `nonce` with a hex private key (EIP-191).
fn sign_challenge(private_key: &str, nonce: &str) -> Result<(String, String), String> {
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    let key = private_key.strip_prefix("0x").unwrap_or(private_key);
    let signer: PrivateKeySigner = key
        .parse()
        .map_err(|e| format!("Invalid private key: {}", e))?;

    let signature = signer
        .sign_message_sync(challenge_message(nonce).as_bytes())
        .map_err(|e| format!("Signing failed: {}", e))?;

    Ok((
        signer.address().to_checksum(None),
        format!("0x{}", hex::encode(signature.as_bytes())),
    ))
}

fn print_sign_usage() {
    eprintln!("Usage: walletgate sign <private_key_hex> <nonce>");
    eprintln!();
    eprintln!("Sign the challenge message for <nonce> and print the address and signature.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  curl 'localhost:3000/auth/challenge?address=0x...'");
    eprintln!("  walletgate sign 0xac09...ff80 <nonce from response>");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() {
    // Check for sign subcommand
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "sign" {
        if args.len() != 4 {
            print_sign_usage();
            std::process::exit(1);
        }

        match sign_challenge(&args[2], &args[3]) {
            Ok((address, signature)) => {
                println!("address:   {}", address);
                println!("signature: {}", signature);
            }
            Err(e) => {
                eprintln!("Error signing challenge: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting walletgate on {}", config.bind_addr);

    // Token service (validates the secret once more before accepting traffic)
    let tokens = Arc::new(
        TokenService::new(
            config.jwt_secret.as_bytes(),
            TimeDelta::try_seconds(config.session_ttl_secs as i64)
                .expect("SESSION_TTL_SECS out of range"),
        )
        .expect("Invalid token configuration"),
    );

    // Open nonce store
    let store = storage::open(
        &config.storage_url,
        Duration::from_secs(config.sweep_interval_secs),
    )
    .await
    .expect("Failed to open nonce store");

    let coordinator = AuthCoordinator::new(
        store,
        Arc::new(EvmSignatureVerifier),
        tokens.clone(),
        Duration::from_secs(config.challenge_ttl_secs),
    );

    tracing::info!(
        protected_prefix = %config.protected_prefix,
        production = config.production,
        "Session gate configured"
    );

    // Build shared state
    let state = AppState {
        coordinator,
        tokens,
        config: Arc::new(config.clone()),
    };

    let app = routes::app(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

// ABOUTME: Main binary for the Comet admin API server and operator bootstrap commands
// ABOUTME: Serves the HTTP API and provides create-admin and reset-password subcommands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comet Admin

//! # Comet Admin Server Binary
//!
//! Starts the admin REST API, or runs one of the operator bootstrap
//! subcommands against the configured database.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comet_admin::{
    auth::{generate_signing_secret, AuthManager},
    config::environment::ServerConfig,
    crypto::password::hash_password,
    database::Database,
    errors, logging,
    models::AdminRole,
    routes::{self, ApiContext},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "comet-admin")]
#[command(about = "Comet Admin - user and license administration API")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve,
    /// Create an operator account
    CreateAdmin {
        /// Admin username
        #[arg(long)]
        username: String,
        /// Admin password (min 8 characters)
        #[arg(long)]
        password: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Grant the superadmin role
        #[arg(long)]
        superadmin: bool,
    },
    /// Reset an operator's password
    ResetPassword {
        /// Admin username
        #[arg(long)]
        username: String,
        /// New password (min 8 characters)
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;
    errors::set_expose_detail(!config.environment.is_production());

    let database = Database::new(&config.database_url.to_connection_string())
        .await
        .context("Failed to open database")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, database).await,
        Command::CreateAdmin {
            username,
            password,
            email,
            superadmin,
        } => create_admin(&database, &username, &password, email.as_deref(), superadmin).await,
        Command::ResetPassword { username, password } => {
            reset_password(&database, &username, &password).await
        }
    }
}

async fn serve(config: ServerConfig, database: Database) -> Result<()> {
    info!("Starting Comet Admin API");
    info!("{}", config.summary());

    let signing_secret = match config.jwt_secret.clone() {
        Some(secret) => secret,
        None => {
            // from_env rejects this combination in production
            warn!("JWT_SECRET not set; generating an ephemeral signing secret");
            warn!("Issued tokens will not survive a restart");
            generate_signing_secret()
        }
    };

    let auth = AuthManager::new(signing_secret.as_bytes(), config.jwt_expiry_hours);
    let context = Arc::new(ApiContext::new(Arc::new(database), Arc::new(auth)));

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| o.parse::<axum::http::HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid CORS origin")?;
        CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    };

    let app = routes::router(context)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install shutdown handler: {e}");
    }
    info!("Shutdown signal received");
}

async fn create_admin(
    database: &Database,
    username: &str,
    password: &str,
    email: Option<&str>,
    superadmin: bool,
) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }
    if database.get_admin_by_username(username).await?.is_some() {
        bail!("Admin '{username}' already exists");
    }

    let role = if superadmin {
        AdminRole::Superadmin
    } else {
        AdminRole::Admin
    };
    let password_hash = hash_password(password)?;
    let admin_id = database
        .create_admin(username, &password_hash, role, email)
        .await?;

    info!(admin_id, username, role = role.as_str(), "Admin created");
    println!("Created {} '{username}' (id {admin_id})", role.as_str());
    Ok(())
}

async fn reset_password(database: &Database, username: &str, password: &str) -> Result<()> {
    if password.len() < 8 {
        bail!("Password must be at least 8 characters");
    }

    let password_hash = hash_password(password)?;
    let affected = database
        .update_admin_password_by_username(username, &password_hash)
        .await?;
    if affected == 0 {
        bail!("Admin '{username}' not found");
    }

    info!(username, "Admin password reset");
    println!("Password updated for '{username}'");
    Ok(())
}

//! OurCalendar server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ourcalendar_lib::api;
use ourcalendar_lib::config::{Config, Environment};
use ourcalendar_lib::db::DbPool;
use ourcalendar_lib::middleware::{AssignRequestId, PanicRecovery, RequestLogger, cors_policy};
use ourcalendar_lib::services::IdentityVerifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env outside production
    if !Environment::from_env_or_default().is_production() {
        dotenvy::dotenv().ok();
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - ENV must be 'development' or 'production' when set");
            error!("  - In production, DATABASE_URL and SESSION_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  OurCalendar Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for unset DATABASE_URL and SESSION_SECRET");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    let verifier = match IdentityVerifier::new(&config) {
        Ok(verifier) => verifier,
        Err(e) => {
            error!("Failed to initialize identity verification: {}", e);
            std::process::exit(1);
        }
    };

    if config.google.client_ids.is_empty() {
        warn!("GOOGLE_CLIENT_IDS is empty; Google tokens for any client will be accepted");
    }
    if config.line.channel_id.is_none() {
        warn!("LINE_CHANNEL_ID is unset; LINE tokens for any channel will be accepted");
    }

    let bind_address = config.bind_address();
    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let verifier = web::Data::new(verifier);

    // Outermost first: request id, logging, panic recovery, CORS
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_policy(&config.cors))
            .wrap(PanicRecovery)
            .wrap(RequestLogger)
            .wrap(AssignRequestId)
            .app_data(config.clone())
            .app_data(pool.clone())
            .app_data(verifier.clone())
            .configure(api::configure)
    });

    server.workers(worker_count).bind(&bind_address)?.run().await
}

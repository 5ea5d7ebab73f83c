use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod models;
mod routes;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::engine::{
    BusinessClock, Services,
    attendance::{AttendanceEngine, LocationMode},
    leave::LeaveWorkflow,
};
use crate::store::mysql::MySqlStore;
use crate::utils::shift_cache::{self, CachedScheduleLookup};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "hrm-presence is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level = tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::DEBUG);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    let clock = BusinessClock::from_hours(config.utc_offset_hours)
        .with_context(|| format!("UTC_OFFSET_HOURS {} is out of range", config.utc_offset_hours))?;
    let location_mode = LocationMode::from_flag(config.trust_default_location);
    if location_mode == LocationMode::TrustDefaultLocation {
        warn!("Check-ins without coordinates will be recorded at the workplace position");
    }

    let store = Arc::new(MySqlStore::new(pool.clone()));
    let cache = shift_cache::build_shift_cache(Duration::from_secs(config.shift_cache_ttl_secs));
    let schedules = Arc::new(CachedScheduleLookup::new(store.clone(), cache.clone()));

    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = shift_cache::warmup_shift_cache(&pool_for_cache_warmup, &cache, 250).await {
            tracing::error!(error = ?e, "Failed to warmup shift cache");
        }
    });

    let services = Data::new(Services {
        attendance: AttendanceEngine::new(
            schedules,
            store.clone(),
            store.clone(),
            store.clone(),
            location_mode,
        ),
        leave: LeaveWorkflow::new(store.clone(), store, clock),
        clock,
    });

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(services.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

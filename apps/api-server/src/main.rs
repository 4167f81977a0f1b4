//! # InnerSpell API Server
//!
//! Actix-web HTTP server for the blog, tarot guidelines and the
//! quota-limited AI interpretation endpoint.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use innerspell_core::ports::TokenService;
use innerspell_infra::JwtTokenService;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::throttle::ThrottleMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env()?;

    tracing::info!(
        "Starting InnerSpell API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;
    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());

    #[cfg(feature = "scheduler")]
    let mut scheduler = {
        use background::scheduler::{Scheduler, SchedulerConfig};

        let scheduler = Scheduler::new(SchedulerConfig::from_env()).await?;
        scheduler.add_sweep(state.clone()).await?;
        scheduler.start().await?;
        scheduler
    };

    #[cfg(not(feature = "scheduler"))]
    {
        let state = state.clone();
        actix_rt::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                ticker.tick().await;
                background::sweeper::sweep_once(&state).await;
            }
        });
    }

    let throttle = state.throttle.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(ThrottleMiddleware::new(throttle.clone()))
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("binding {}:{}", config.host, config.port))?
    .run()
    .await?;

    #[cfg(feature = "scheduler")]
    scheduler.shutdown().await?;

    Ok(())
}

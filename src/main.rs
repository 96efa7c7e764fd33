mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use std::sync::Arc;

use actix_web::{middleware::{Logger, NormalizePath, TrailingSlash}, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::services::auth_service::AuthService;
use crate::services::mailer::{ConsoleMailer, Mailer, SmtpMailer};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!("connecting to database");
    let db = db::establish_connection(&config).await.map_err(|e| {
        tracing::error!(error = %e, "failed to connect to database");
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
    tracing::info!("database connected");

    let mailer: Arc<dyn Mailer> = match &config.email {
        Some(email) => {
            tracing::info!(smtp_host = %email.smtp_host, "using SMTP mailer");
            Arc::new(SmtpMailer::new(email.clone()))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, confirmation emails are printed to stdout");
            Arc::new(ConsoleMailer::stdout())
        }
    };

    let auth = AuthService::new(&config, mailer)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let db = web::Data::new(db);
    let auth = web::Data::new(auth);
    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    tracing::info!(host = %bind.0, port = bind.1, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::new(TrailingSlash::Trim))
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(auth.clone())
            .app_data(config.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use log::{error, info};
use sqlx::mysql::MySqlPoolOptions;

mod auth;
mod config;
mod db;
mod errors;
mod models;
mod notify;
mod routes;

use config::Settings;
use notify::{LogNotifier, Notifier};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .map_err(|e| {
            error!("Failed to create pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e)
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new(settings.email_sender.clone()));
    let server_address = settings.server_address.clone();
    info!("Server running at http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::from(notifier.clone()))
            .route("/", web::get().to(|| async { HttpResponse::Ok().body("GRC backend is running") }))
            .configure(routes::routes::configure)
    })
    .bind(server_address)?
    .run()
    .await
}

mod config;
mod error;
mod payment;
mod render;
mod services;
mod state;
mod store;

use crate::config::Config;
use crate::payment::MercadoPagoGateway;
use crate::render::RenderPipeline;
use crate::state::AppState;
use crate::store::{DiskFileStore, SqliteStore};
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config =
        Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let store = Arc::new(SqliteStore::open(&config.database_path).map_err(io::Error::other)?);
    if config.mercado_pago_token.is_none() {
        warn!("MERCADO_PAGO_ACCESS_TOKEN is not set; checkout and payment webhooks will fail");
    }
    info!(
        "Previews print with Chromium, final PDFs with the {:?} engine, database {}",
        config.pdf_engine,
        config.database_path.display()
    );

    let state = AppState {
        templates: store.clone(),
        documents: store,
        files: Arc::new(DiskFileStore::new(config.files_dir.clone())),
        pipeline: RenderPipeline::new(
            render::pdf::preview_engine(&config),
            config.watermark_text.clone(),
        )
        .with_document_engine(render::pdf::document_engine(&config)),
        payments: Arc::new(MercadoPagoGateway::new(
            config.mercado_pago_token.clone(),
            config.public_url.clone(),
        )),
        format_policy: config.format_policy,
    };

    info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(services::json_config())
            .app_data(web::Data::new(state.clone()))
            .service(services::templates::configure_routes())
            .service(services::documents::configure_routes())
            .service(services::webhooks::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

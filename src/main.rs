use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use condo_billing::api::membership::MembershipReconcilers;
use condo_billing::config::Config;
use condo_billing::db::init_store;
use condo_billing::docs::ApiDoc;
use condo_billing::{CompensationLedger, routes};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Condominium billing service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.store_backend, "Server starting...");

    let store = init_store(&config).await?;
    let ledger = Data::new(CompensationLedger::new(store.clone()));
    let reconcilers = Data::new(MembershipReconcilers::new(store));

    let server_addr = config.server_addr.clone();
    let route_config = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(ledger.clone())
            .app_data(reconcilers.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &route_config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

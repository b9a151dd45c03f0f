pub mod application;
pub mod config;
pub mod db;
pub mod doc;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::shipping_service::ShippingService;
use config::ServiceConfig;
use infrastructure::shipping_repo::DieselShippingRepository;
use infrastructure::system::{SystemClock, ThreadRandom};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), String> {
    let mut conn = pool.get().map_err(|e| e.to_string())?;
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Wire the Postgres-backed service with production randomness and clock.
pub fn build_service(pool: DbPool, config: &ServiceConfig) -> Result<ShippingService, config::ConfigError> {
    Ok(ShippingService::new(
        Arc::new(DieselShippingRepository::new(pool)),
        Arc::new(config.courier_registry()?),
        Arc::new(ThreadRandom),
        Arc::new(SystemClock),
        config.issuer_settings(),
    ))
}

/// Register every shipping route. Expects `web::Data<ShippingService>` in app data.
pub fn routes(cfg: &mut web::ServiceConfig) {
    use handlers::shipping;

    cfg.service(
        web::scope("/couriers")
            .route("", web::get().to(shipping::list_couriers))
            .route("/{id}", web::get().to(shipping::get_courier)),
    )
    .service(
        web::scope("/shipping")
            .route("/rates", web::post().to(shipping::get_rates))
            .route("/labels", web::post().to(shipping::create_label))
            .route(
                "/labels/{tracking_number}/tracking",
                web::get().to(shipping::track),
            )
            .route(
                "/labels/{tracking_number}/status",
                web::put().to(shipping::update_status),
            ),
    )
    .route(
        "/sellers/{seller_id}/labels",
        web::get().to(shipping::list_seller_labels),
    )
    .service(
        web::scope("/orders")
            .route("/{order_id}/label", web::get().to(shipping::get_order_label))
            .route(
                "/{order_id}/shipment",
                web::get().to(shipping::get_order_shipment),
            ),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: ShippingService,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", doc::ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

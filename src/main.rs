use std::io;

use dotenvy::dotenv;
use shipping_service::config::ServiceConfig;
use shipping_service::{build_server, build_service, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = ServiceConfig::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let service = build_service(pool, &config).map_err(io::Error::other)?;
    log::info!(
        "Loaded {} courier partners, label issue attempts = {}",
        service.list_partners().len(),
        config.issue_attempts
    );

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(service, &config.host, config.port)?.await
}

use std::sync::Arc;

use dotenvy::dotenv;
use storefront_service::config::AppConfig;
use storefront_service::infrastructure::paystack::PaystackGateway;
use storefront_service::{build_server, create_pool, run_migrations};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("invalid configuration");

    let pool = create_pool(&config.database_url);
    run_migrations(&pool);

    let gateway = Arc::new(PaystackGateway::new(&config.gateway));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(
        pool,
        gateway,
        config.pricing.clone(),
        &config.host,
        config.port,
    )?
    .await
}

pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::checkout::CheckoutService;
use application::discounts::DiscountAdminService;
use application::orders::OrderAdminService;
use application::payments::PaymentService;
use domain::cart::PricingPolicy;
use domain::ports::{DiscountStore, OrderStore, PaymentGateway, ProductCatalog};
use infrastructure::catalog_repo::DieselProductCatalog;
use infrastructure::discount_repo::DieselDiscountStore;
use infrastructure::order_repo::DieselOrderStore;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::checkout::submit,
        handlers::payments::verify,
        handlers::payments::initiate,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::discounts::create_discount,
        handlers::discounts::deactivate_discount,
        handlers::discounts::list_discounts,
    ),
    components(schemas(
        handlers::checkout::CheckoutItemRequest,
        handlers::checkout::CustomerRequest,
        handlers::checkout::CheckoutRequestBody,
        handlers::checkout::CheckoutResponse,
        handlers::payments::PaymentIntentResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::PricingResponse,
        handlers::orders::OrderResponse,
        handlers::orders::ListOrdersResponse,
        handlers::orders::UpdateStatusRequest,
        handlers::discounts::CreateDiscountRequest,
        handlers::discounts::DiscountResponse,
    )),
    tags(
        (name = "checkout", description = "Cart pricing and order creation"),
        (name = "payments", description = "Payment initiation and verification"),
        (name = "orders", description = "Order lookup and fulfillment"),
        (name = "discounts", description = "Discount code registry"),
    )
)]
struct ApiDoc;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-service"
    }))
}

/// Build an actix-web `Server` bound to `host:port`; the caller awaits or
/// spawns it.
///
/// The gateway is injected so tests can substitute a stub; production wiring
/// passes the Paystack client.
pub fn build_server(
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
    policy: PricingPolicy,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let catalog: Arc<dyn ProductCatalog> = Arc::new(DieselProductCatalog::new(pool.clone()));
    let discounts: Arc<dyn DiscountStore> = Arc::new(DieselDiscountStore::new(pool.clone()));
    let orders: Arc<dyn OrderStore> = Arc::new(DieselOrderStore::new(pool));

    let checkout_service = web::Data::new(CheckoutService::new(
        catalog,
        discounts.clone(),
        orders.clone(),
        gateway.clone(),
        policy,
    ));
    let payment_service = web::Data::new(PaymentService::new(orders.clone(), gateway));
    let order_admin = web::Data::new(OrderAdminService::new(orders));
    let discount_admin = web::Data::new(DiscountAdminService::new(discounts));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(checkout_service.clone())
            .app_data(payment_service.clone())
            .app_data(order_admin.clone())
            .app_data(discount_admin.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .route("/health", web::get().to(health))
            .route("/checkout", web::post().to(handlers::checkout::submit))
            .route(
                "/payments/{reference}/verify",
                web::get().to(handlers::payments::verify),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{reference}", web::get().to(handlers::orders::get_order))
                    .route(
                        "/{reference}/status",
                        web::post().to(handlers::orders::update_status),
                    )
                    .route(
                        "/{reference}/pay",
                        web::post().to(handlers::payments::initiate),
                    ),
            )
            .service(
                web::scope("/discounts")
                    .route("", web::post().to(handlers::discounts::create_discount))
                    .route("", web::get().to(handlers::discounts::list_discounts))
                    .route(
                        "/{code}/deactivate",
                        web::post().to(handlers::discounts::deactivate_discount),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

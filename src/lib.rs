pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::order_service::OrderService;
pub use application::user_service::UserService;
pub use db::{create_pool, DbPool};
pub use infrastructure::{DieselOrderRepository, InMemoryStore, OrderBackend};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The order service as wired into the HTTP server.
pub type AppOrderService = OrderService<OrderBackend>;
/// The user service as wired into the HTTP server.
pub type AppUserService = UserService<OrderBackend>;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::count_orders,
        handlers::orders::get_order,
        handlers::orders::get_order_by_number,
        handlers::orders::update_order,
        handlers::orders::cancel_order,
        handlers::users::register_user,
    ),
    tags(
        (name = "orders", description = "Purchase order management"),
        (name = "users", description = "User records principals resolve to"),
    )
)]
pub struct ApiDoc;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Registers the user and order routes. Fixed segments come before `/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/api/users",
        web::post().to(handlers::users::register_user),
    );
    cfg.service(
        web::scope("/api/orders")
            .route("", web::post().to(handlers::orders::create_order))
            .route("", web::get().to(handlers::orders::list_orders))
            .route("/count", web::get().to(handlers::orders::count_orders))
            .route(
                "/number/{order_number}",
                web::get().to(handlers::orders::get_order_by_number),
            )
            .route("/{id}", web::get().to(handlers::orders::get_order))
            .route("/{id}", web::put().to(handlers::orders::update_order))
            .route("/{id}", web::delete().to(handlers::orders::cancel_order)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`, serving the
/// order and user services over `backend`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    backend: OrderBackend,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let orders: web::Data<AppOrderService> = web::Data::new(OrderService::new(backend.clone()));
    let users: web::Data<AppUserService> = web::Data::new(UserService::new(backend));
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(orders.clone())
            .app_data(users.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

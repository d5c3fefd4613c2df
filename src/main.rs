use dotenvy::dotenv;
use order_management::config::Settings;
use order_management::{
    build_server, create_pool, run_migrations, DieselOrderRepository, OrderBackend,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().unwrap_or_else(|e| {
        log::error!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let pool = create_pool(&settings.database_url, settings.pool_size)
        .map_err(|e| std::io::Error::other(format!("Failed to create database pool: {}", e)))?;
    run_migrations(&pool)
        .map_err(|e| std::io::Error::other(format!("Failed to run database migrations: {}", e)))?;

    let backend = OrderBackend::Postgres(DieselOrderRepository::new(pool));

    log::info!(
        "Starting server at http://{}:{}",
        settings.host,
        settings.port
    );

    build_server(backend, &settings.host, settings.port)?.await
}

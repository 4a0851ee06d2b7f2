use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use onboardly_api::app::{self, AppServices};

#[tokio::main]
async fn main() {
    onboardly_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let services = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(8)
                .connect(&url)
                .await
                .expect("failed to connect to DATABASE_URL");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .expect("failed to run migrations");

            AppServices::postgres(pool)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage");
            let (services, _store) = AppServices::in_memory();
            services
        }
    };

    let app = app::build_app(jwt_secret, Arc::new(services));

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

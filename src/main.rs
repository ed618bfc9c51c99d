use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use timetracker_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth::require_bearer_auth, cors::permissive_cors},
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let api = Router::new()
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/users", get(routes::users::list_users))
        .route(
            "/api/users/me",
            get(routes::users::get_current_user)
                .put(routes::users::update_current_user)
                .delete(routes::users::deactivate_current_user),
        )
        .route("/api/users/:id", get(routes::users::get_user))
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/time-entries",
            get(routes::time_entries::list_time_entries)
                .post(routes::time_entries::create_time_entry),
        )
        .route(
            "/api/time-entries/current",
            get(routes::time_entries::get_current_time_entry),
        )
        .route(
            "/api/time-entries/start",
            post(routes::time_entries::start_time_entry),
        )
        .route(
            "/api/time-entries/:id/stop",
            post(routes::time_entries::stop_time_entry),
        )
        .route(
            "/api/time-entries/:id",
            get(routes::time_entries::get_time_entry)
                .patch(routes::time_entries::update_time_entry)
                .delete(routes::time_entries::delete_time_entry),
        )
        .layer(axum::middleware::from_fn(require_bearer_auth));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

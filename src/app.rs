use std::future::Future;
use std::net::TcpListener;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{routing, Router};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::upload::UPLOAD_DIR;

pub fn build(state: AppState) -> Router<()> {
    let service = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    // ServeDir sees the full request path, so rooting it at the storage root
    // maps `/uploads/<name>` onto `<storage root>/uploads/<name>`.
    let uploaded_files = ServeDir::new(state.storage_fs.base_path());

    Router::new()
        .route(
            "/newsletter-list",
            routing::get(handlers::newsletter::list_newsletters),
        )
        .route(
            "/newsletter-create",
            routing::post(handlers::newsletter::create_newsletter),
        )
        .route("/home", routing::get(handlers::profile::get_home))
        .route("/users", routing::get(handlers::users::get_users))
        .merge(
            Router::new()
                .route(
                    &format!("/{UPLOAD_DIR}"),
                    routing::post(handlers::upload::post_upload),
                )
                .route("/profile", routing::post(handlers::profile::post_profile))
                .layer(DefaultBodyLimit::max(usize::MAX))
                .with_state(state.clone()),
        )
        .route(
            &format!("/{UPLOAD_DIR}/*file"),
            routing::get_service(uploaded_files).handle_error(|err: std::io::Error| async move {
                tracing::error!("Error serving uploaded file: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:?}"))
            }),
        )
        .fallback(handlers::not_found)
        .layer(service)
        .with_state(state)
}

/// Serves `app` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), axum::BoxError>
where
    F: Future<Output = ()>,
{
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

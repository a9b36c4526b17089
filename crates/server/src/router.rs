use super::{handlers, state::AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

/// Multipart framing and the `key_fields` part on top of the file itself.
const UPLOAD_BODY_OVERHEAD: usize = 1024 * 1024;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = app_state.config.max_file_size + UPLOAD_BODY_OVERHEAD;
    let uploads = ServeDir::new(&app_state.config.upload_dir);
    let cors = cors_layer(&app_state.config.allowed_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route(
            "/upload-pdf",
            post(handlers::upload_pdf_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/document/{doc_id}", get(handlers::get_document_handler))
        .route(
            "/document/{doc_id}/page/{page}",
            get(handlers::get_page_handler),
        )
        .route(
            "/document/{doc_id}/page/{page}/extract",
            post(handlers::reextract_page_handler),
        )
        .route(
            "/document/{doc_id}/page/{page}/image",
            get(handlers::page_image_handler),
        )
        .route(
            "/document/{doc_id}/page/{page}/language",
            get(handlers::page_language_handler),
        )
        .nest_service("/uploads", uploads)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%origin, "Ignoring invalid CORS origin: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

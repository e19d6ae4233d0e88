use crate::{
    config::MULTIPART_OVERHEAD_BYTES,
    handlers::{feedback_handlers, note_handlers, user_handlers},
    middleware::{require_auth, track_visit},
    AppState,
};
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::{path::PathBuf, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Upper bound on the time spent serving a single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Builds the full application router.
///
/// `media_dir` is served under `/media` when notes are kept in a local directory.
pub fn build_router(state: AppState, media_dir: Option<PathBuf>) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let protected_routes = Router::new()
        .route("/profile", get(user_handlers::profile))
        .route("/admin/users", get(user_handlers::list_users))
        .route("/uploads", post(note_handlers::upload_note))
        .route(
            "/notes/{id}",
            get(note_handlers::get_note)
                .put(note_handlers::update_note)
                .delete(note_handlers::delete_note),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api_routes = Router::new()
        // Accounts
        .route("/signup", post(user_handlers::signup))
        .route("/signin", post(user_handlers::signin))
        .route("/verify/{token}", get(user_handlers::verify_email))
        // Notes
        .route("/notes", get(note_handlers::list_notes))
        .route(
            "/notes/semester/{semester}",
            get(note_handlers::notes_by_semester),
        )
        .route("/total-downloads", get(note_handlers::total_downloads))
        .route("/download-count/{id}", get(note_handlers::download_count))
        .route(
            "/increment-download/{id}",
            post(note_handlers::increment_download),
        )
        .route("/device-counts", get(note_handlers::device_counts))
        // Feedback
        .route(
            "/feedback",
            post(feedback_handlers::create_feedback).get(feedback_handlers::list_feedback),
        )
        .route("/feedback/count", get(feedback_handlers::feedback_count))
        .route(
            "/feedback/{id}",
            get(feedback_handlers::get_feedback)
                .put(feedback_handlers::update_feedback)
                .delete(feedback_handlers::delete_feedback),
        )
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), track_visit));

    let mut app = Router::new()
        .route("/", get(index_handler))
        .nest("/api", api_routes);

    if let Some(dir) = media_dir {
        app = app.nest_service("/media", ServeDir::new(dir));
    }

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(add_security_headers))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

async fn index_handler() -> &'static str {
    "Hello World!"
}

async fn add_security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

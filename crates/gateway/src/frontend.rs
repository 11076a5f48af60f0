//! The embedded chat widget.
//!
//! `frontend/` is compiled into the binary with `include_str!`, so the
//! service ships as a single executable.

use axum::{
    Router,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Routes for `/` and the widget's static assets.
pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/static/style.css", get(|| asset("text/css; charset=utf-8", STYLE_CSS)))
        .route(
            "/static/app.js",
            get(|| asset("application/javascript; charset=utf-8", APP_JS)),
        )
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn asset(content_type: &'static str, body: &'static str) -> Response {
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

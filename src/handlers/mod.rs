pub(crate) mod newsletter;
pub(crate) mod profile;
pub(crate) mod upload;
pub(crate) mod users;

use axum::http::{StatusCode, Uri};
use axum::Json;
use serde_json::{json, Value};

pub(crate) async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    tracing::info!("No route for {uri}");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "title": "Not Found", "message": format!("Not Found - {uri}") })),
    )
}

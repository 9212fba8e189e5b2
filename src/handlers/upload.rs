use axum::extract::{Multipart, State};

use crate::error::Result;
use crate::state::AppState;

pub(crate) const FILE_FIELD: &str = "myFile";

pub(crate) async fn post_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<&'static str> {
    let form = state.storage_fs.receive(multipart, FILE_FIELD).await?;
    match form.file {
        Some(f) => tracing::info!("{f:?}"),
        None => tracing::info!("No file submitted under {FILE_FIELD}"),
    }
    Ok("File uploaded successfully!")
}

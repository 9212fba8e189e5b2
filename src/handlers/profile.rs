use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::error::{AppError, Result};
use crate::state::AppState;

pub(crate) const AVATAR_FIELD: &str = "avatar";
pub(crate) const NO_PROFILE: &str = "No Profile Found";

#[tracing::instrument(skip(state, multipart), level = "debug")]
pub(crate) async fn post_profile(State(state): State<AppState>, multipart: Multipart) -> Response {
    match save_profile(&state, multipart).await {
        // express style 302, axum's Redirect only does 303/307/308
        Ok(()) => (StatusCode::FOUND, [(header::LOCATION, "/home")]).into_response(),
        Err(err) => {
            tracing::error!("Error saving profile: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving profile.").into_response()
        }
    }
}

async fn save_profile(state: &AppState, multipart: Multipart) -> Result<()> {
    let form = state.storage_fs.receive(multipart, AVATAR_FIELD).await?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::Validation(format!("No file under {AVATAR_FIELD}")))?;
    let username = form
        .text("username")
        .ok_or_else(|| AppError::Validation("No username".to_string()))?;

    state.db.create_profile(username, &file.path).await?;
    Ok(())
}

#[tracing::instrument(skip(state), level = "debug")]
pub(crate) async fn get_home(State(state): State<AppState>) -> Response {
    match render_home(&state).await {
        Ok(html) => html.into_response(),
        Err(err) => {
            tracing::error!("Error fetching profile: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error fetching profile data.").into_response()
        }
    }
}

async fn render_home(state: &AppState) -> Result<Html<String>> {
    let profile = state.db.get_current_profile().await?;

    let mut ctx = tera::Context::new();
    ctx.insert(
        "username",
        profile.as_ref().map_or(NO_PROFILE, |p| p.username.as_str()),
    );
    ctx.insert("avatar", &profile.as_ref().map(|p| p.avatar.as_str()));

    Ok(state.render("home.html", &ctx)?.into())
}

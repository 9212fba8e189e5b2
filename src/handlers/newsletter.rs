use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::result::Result as StdResult;

use crate::db::{NewNewsletter, NewsletterError};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body accepted by the create endpoint. Everything is optional here so that
/// a missing field gets the same answer as an empty one.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNewsletterForm {
    title: Option<String>,
    author: Option<String>,
    date: Option<String>,
    image_url: Option<String>,
    description: Option<String>,
}

impl CreateNewsletterForm {
    fn validate(&self) -> Option<NewNewsletter<'_>> {
        fn required(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|s| !s.is_empty())
        }

        Some(NewNewsletter {
            title: required(&self.title)?,
            author: required(&self.author)?,
            date: required(&self.date)?,
            image_url: required(&self.image_url)?,
            description: required(&self.description)?,
        })
    }
}

/// An empty collection is a regular 200, only a failing query is a 404.
#[tracing::instrument(skip(state), level = "debug")]
pub(crate) async fn list_newsletters(State(state): State<AppState>) -> Response {
    match state.db.list_newsletters().await {
        Ok(newsletters) => (StatusCode::OK, Json(newsletters)).into_response(),
        Err(err) => {
            tracing::error!("Cannot list newsletters: {err:?}");
            (StatusCode::NOT_FOUND, Json(json!({ "err": err.to_string() }))).into_response()
        }
    }
}

#[tracing::instrument(skip(state, form), level = "debug")]
pub(crate) async fn create_newsletter(
    State(state): State<AppState>,
    form: StdResult<Json<CreateNewsletterForm>, JsonRejection>,
) -> Result<Response> {
    let form = match form {
        Ok(Json(f)) => f,
        Err(err) => {
            tracing::info!("Invalid newsletter body submitted {err:?}");
            CreateNewsletterForm::default()
        }
    };

    let nn = form
        .validate()
        .ok_or_else(|| AppError::Validation("Please fill all fields".to_string()))?;

    match state.db.create_newsletter(nn).await? {
        Err(NewsletterError::AlreadyExist) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "NewsLetter exists" })),
        )
            .into_response()),
        Ok(newsletter) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "User Registered Successfully",
                "user": newsletter,
            })),
        )
            .into_response()),
    }
}

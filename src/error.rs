use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Templating error")]
    TemplateError(#[from] tera::Error),

    #[error("DB error at {path}: {source}")]
    DBInitError { path: String, source: sqlx::Error },

    #[error("DB error {message} - {source}")]
    DBError {
        message: String,
        source: sqlx::Error,
    },

    #[error("Migration error {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Validation(String),

    #[error("Unexpected field {0}")]
    UnexpectedField(String),

    #[error("Malformed multipart body {0}")]
    Multipart(#[from] MultipartError),

    #[error("Upload error {message} - {source}")]
    UploadError {
        message: String,
        source: std::io::Error,
    },
}

impl From<sqlx::Error> for AppError {
    fn from(source: sqlx::Error) -> Self {
        AppError::DBError {
            message: "query failed".to_string(),
            source,
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    title: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title) = match self {
            AppError::Validation(_) | AppError::UnexpectedField(_) => {
                tracing::info!("Rejected request: {self}");
                (StatusCode::BAD_REQUEST, "Validation Failed")
            }
            AppError::Multipart(_) => {
                tracing::info!("Rejected upload: {self}");
                (StatusCode::BAD_REQUEST, "Upload Failed")
            }
            _ => {
                tracing::error!("Server error: {self:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
        };
        let body = ErrorBody {
            title,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub(crate) trait DBErrorContext<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: ToString + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> DBErrorContext<T> for sqlx::Result<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: ToString + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|source| AppError::DBError {
            message: f().to_string(),
            source,
        })
    }
}

pub(crate) trait UploadErrorContext<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: ToString + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> UploadErrorContext<T> for std::io::Result<T> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: ToString + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|source| AppError::UploadError {
            message: f().to_string(),
            source,
        })
    }
}

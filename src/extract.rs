use crate::errors::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

/// `axum::Json` with rejections reported as 400 through `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

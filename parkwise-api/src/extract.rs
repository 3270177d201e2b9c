use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `Json` body whose rejection renders as an `AppError`, so malformed or
/// incomplete bodies get the usual `{"error": ..}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` parameters with the same rejection handling as [`AppJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

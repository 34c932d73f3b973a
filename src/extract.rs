use axum::extract::{FromRequest, FromRequestParts, Json, Path};

use crate::error::AppError;

/// ApiJson
///
/// `Json<T>` whose rejection (bad content type, malformed body, wrong field
/// types) is reported through `AppError` instead of axum's plain-text body.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// ApiPath
///
/// `Path<T>` with the same error envelope; a non-numeric id becomes a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

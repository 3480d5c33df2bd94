//! Extraction helpers that route axum's body and path rejections through
//! [`AppError`], so malformed input gets the same error envelope as every
//! other failure.
//!
//! Handlers take `Result<Json<T>, JsonRejection>` / `Result<Path<T>, PathRejection>`
//! and unwrap them here.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Json,
};

use crate::error::AppError;

pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::Validation(err.body_text()))
}

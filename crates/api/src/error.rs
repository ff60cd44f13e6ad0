//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commander::{CommandError, RegistryError};
use store::StoreError;

use crate::ledger::LedgerError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The command pipeline refused or failed the command.
    Command(CommandError),
    /// Reading from the store failed.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Command(err) => (command_status(&err), err.to_string()),
            ApiError::Store(err) => (store_status(&err), err.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn command_status(err: &CommandError) -> StatusCode {
    if let CommandError::InvalidCommand { .. } | CommandError::InvalidEvent { .. } = err {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    if let Some(registry_err) = err.collaborator_ref::<RegistryError>() {
        return match registry_err {
            RegistryError::UnknownCommand(_) => StatusCode::NOT_FOUND,
            RegistryError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
            RegistryError::UnknownEvent(_) | RegistryError::AlreadyRegistered(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
    }
    if let Some(store_err) = err.collaborator_ref::<StoreError>() {
        return store_status(store_err);
    }
    if err.collaborator_ref::<LedgerError>().is_some() {
        return StatusCode::CONFLICT;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::PayloadTooLarge { .. } | StoreError::UnsupportedCharacter { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoreError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
        StoreError::AggregateTypeMismatch { .. }
        | StoreError::InjectedFailure(_)
        | StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        ApiError::Command(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

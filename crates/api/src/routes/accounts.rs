//! Account command and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use commander::{AggregateRef, CommandContext, EventRecord};
use serde::Serialize;
use serde_json::Value;
use store::{AggregateId, StoredRecord};

use crate::AppState;
use crate::error::ApiError;
use crate::ledger::Account;

/// Header whose value is passed to commands as the `actor` context entry.
pub const ACTOR_HEADER: &str = "x-actor";

// -- Response types --

#[derive(Serialize)]
pub struct RecordResponse {
    pub record_id: String,
    pub name: String,
    pub data: Value,
    pub recorded_at: String,
}

impl From<&EventRecord<Account>> for RecordResponse {
    fn from(record: &EventRecord<Account>) -> Self {
        Self {
            record_id: record.id().to_string(),
            name: record.name().to_string(),
            data: record.data().clone(),
            recorded_at: record.recorded_at().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub records: Vec<RecordResponse>,
    pub account: Account,
}

// -- Handlers --

/// POST /accounts/:id/commands/:name: Run a ledger command against an account.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<CommandResponse>, ApiError> {
    let account_id = parse_account_id(&id)?;
    let account = state
        .store
        .load::<Account>(account_id)?
        .unwrap_or_else(|| Account::new(account_id));
    let account = AggregateRef::new(account);

    let mut context = CommandContext::new().with("account_id", account_id.to_string());
    if let Some(actor) = headers.get(ACTOR_HEADER).and_then(|v| v.to_str().ok()) {
        context = context.with("actor", actor);
    }

    let records = state
        .commander
        .execute_with_context(&account, &format!("account/{name}"), payload, context)
        .await?;

    Ok(Json(CommandResponse {
        records: records.iter().map(RecordResponse::from).collect(),
        account: account.snapshot(),
    }))
}

/// GET /accounts/:id: Load the stored state of an account.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Account>, ApiError> {
    let account_id = parse_account_id(&id)?;
    let account = state
        .store
        .load::<Account>(account_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Account {id} not found")))?;
    Ok(Json(account))
}

/// GET /accounts/:id/events: List the committed records of an account.
#[tracing::instrument(skip(state))]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StoredRecord>>, ApiError> {
    let account_id = parse_account_id(&id)?;
    Ok(Json(state.store.records_for(account_id)))
}

fn parse_account_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

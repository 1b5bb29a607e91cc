//! Reference registry read endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    models::{ActorContext, CityRecord, IdentityRecord},
    utils::AppError,
    AppState,
};

/// Registry identity as returned to clients, with the masked document
#[derive(Debug, Serialize)]
struct IdentityView {
    #[serde(flatten)]
    record: IdentityRecord,
    formatted_document: Option<String>,
}

impl From<IdentityRecord> for IdentityView {
    fn from(record: IdentityRecord) -> Self {
        Self {
            formatted_document: record.formatted_document(),
            record,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/people/{cpf}", get(get_person))
        .route("/legal-entities/{cnpj}", get(get_legal_entity))
        .route("/cities/{code}", get(get_city))
}

async fn get_person(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cpf): Path<String>,
) -> Result<Json<IdentityView>, AppError> {
    state
        .pipeline
        .person(&cpf, &ctx)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| AppError::not_found(format!("person {} not registered", cpf)))
}

async fn get_legal_entity(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
) -> Result<Json<IdentityView>, AppError> {
    state
        .pipeline
        .legal_entity(&cnpj, &ctx)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| AppError::not_found(format!("legal entity {} not registered", cnpj)))
}

async fn get_city(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(code): Path<String>,
) -> Result<Json<CityRecord>, AppError> {
    state
        .pipeline
        .city(&code, &ctx)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("city {} not registered", code)))
}

//! Establishment API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::{
    models::{ActorContext, AuditRecord, Establishment, EstablishmentPatch, NewEstablishment},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_establishment))
        .route(
            "/{cnpj}",
            get(get_establishment).put(update_establishment),
        )
        .route("/{cnpj}/deactivate", post(deactivate_establishment))
        .route("/{cnpj}/reactivate", post(reactivate_establishment))
        .route("/{cnpj}/audit", get(list_audit_records))
}

async fn create_establishment(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<NewEstablishment>,
) -> Result<(StatusCode, Json<Establishment>), AppError> {
    payload.validate()?;

    let created = state.pipeline.create(payload, &ctx).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_establishment(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
) -> Result<Json<Establishment>, AppError> {
    Ok(Json(state.pipeline.get(&cnpj, &ctx).await?))
}

async fn update_establishment(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
    Json(payload): Json<EstablishmentPatch>,
) -> Result<Json<Establishment>, AppError> {
    payload.validate()?;

    Ok(Json(state.pipeline.update(&cnpj, payload, &ctx).await?))
}

async fn deactivate_establishment(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
) -> Result<Json<Establishment>, AppError> {
    Ok(Json(state.pipeline.deactivate(&cnpj, &ctx).await?))
}

async fn reactivate_establishment(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
) -> Result<Json<Establishment>, AppError> {
    Ok(Json(state.pipeline.reactivate(&cnpj, &ctx).await?))
}

async fn list_audit_records(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(cnpj): Path<String>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    Ok(Json(state.pipeline.history(&cnpj, &ctx).await?))
}
